use std::fs;

use anyhow::Context;
use binding::{ControlAction, ControlClassifier, ControlDescriptor, ControlId};
use cli::args::OutputFormatArg;
use shipping::ShipmentId;
use tracing::{info, Level};

use crate::config::CliConfig;
use crate::opts::ClassifyArgs;

#[derive(Debug, PartialEq, serde::Serialize)]
struct Verdict {
    control_id: ControlId,
    label: String,
    shipment_id: Option<ShipmentId>,
    action: Option<ControlAction>,
    rejection: Option<String>,
}

#[tracing::instrument(level = Level::DEBUG)]
pub(crate) fn classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = CliConfig::load(args.config.as_deref())?;

    let content = fs::read_to_string(&args.controls)
        .with_context(|| format!("Reading controls. path: {}", args.controls.display()))?;
    let controls: Vec<ControlDescriptor> = serde_json::from_str(&content)
        .with_context(|| format!("Parsing controls. path: {}", args.controls.display()))?;

    let classifier = ControlClassifier::new(config.monitor.trace_classifications);
    let verdicts = classify_all(&classifier, controls);

    info!(
        "Classified controls. controls: {}, linking: {}",
        verdicts.len(),
        verdicts
            .iter()
            .filter(|verdict| verdict.action.is_some())
            .count()
    );

    match args.format {
        OutputFormatArg::Text => {
            for verdict in verdicts.iter() {
                match &verdict.action {
                    Some(action) => println!("{} '{}': {}", verdict.control_id, verdict.label, action),
                    None => println!(
                        "{} '{}': rejected, {}",
                        verdict.control_id,
                        verdict.label,
                        verdict
                            .rejection
                            .as_deref()
                            .unwrap_or_default()
                    ),
                }
            }
        }
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&verdicts)?),
    }

    Ok(())
}

fn classify_all(classifier: &ControlClassifier, controls: Vec<ControlDescriptor>) -> Vec<Verdict> {
    controls
        .into_iter()
        .map(|control| {
            let (action, rejection) = match classifier.classify(&control) {
                Ok(action) => (Some(action), None),
                Err(rejection) => (None, Some(rejection.to_string())),
            };
            Verdict {
                control_id: control.id,
                label: control.label,
                shipment_id: control.row_shipment_id,
                action,
                rejection,
            }
        })
        .collect()
}
