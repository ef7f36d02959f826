use clap::ValueEnum;
use shipping::ShipmentType;

/// Args decouple of CLI arg handling requirements from the internal data structures

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum ShipmentTypeArg {
    Container,
    Awb,
    Bl,
    Lcl,
    Parcel,
    Other,
}

impl From<ShipmentTypeArg> for ShipmentType {
    fn from(value: ShipmentTypeArg) -> Self {
        match value {
            ShipmentTypeArg::Container => Self::Container,
            ShipmentTypeArg::Awb => Self::Awb,
            ShipmentTypeArg::Bl => Self::Bl,
            ShipmentTypeArg::Lcl => Self::Lcl,
            ShipmentTypeArg::Parcel => Self::Parcel,
            ShipmentTypeArg::Other => Self::Other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "lower")]
pub enum OutputFormatArg {
    #[default]
    Text,
    Json,
}
