//! Word lists used to recognise linking controls, English and Italian.
//!
//! Text is split into lowercase words, on non-alphanumeric characters and camelCase boundaries,
//! so `btn-closeModal` yields `btn`, `close` and `modal`.

use heck::ToSnakeCase;

use crate::control::ControlAction;

/// A control whose visible text contains one of these words is never a linking control.
pub const EXCLUSION_TERMS: &[&str] = &[
    "close", "chiudi", "cancel", "annulla", "save", "salva", "delete", "elimina", "remove", "rimuovi",
    "search", "cerca", "filter", "filtra", "sort", "ordina", "refresh", "aggiorna", "export", "esporta",
    "import", "importa", "print", "stampa",
    // pagination
    "page", "pagina", "next", "successivo", "successiva", "prev", "previous", "precedente", "first", "last",
    // expand/collapse
    "expand", "espandi", "collapse", "comprimi",
];

pub const ACTION_VERBS: &[(ControlAction, &[&str])] = &[
    (ControlAction::Manage, &["manage", "gestisci", "edit", "modifica"]),
    (ControlAction::Add, &["add", "aggiungi", "plus"]),
    (ControlAction::Link, &["link", "collega", "associa", "chain"]),
];

/// Matched as word prefixes, `prodott` matches `prodotto` and `prodotti`.
pub const PRODUCT_STEMS: &[&str] = &["product", "prodott", "articol"];

pub const PRODUCT_ICONS: &[&str] = &["box", "boxes", "package", "cube", "cubes"];

pub const DECLARED_TAGS: &[(&str, ControlAction)] = &[
    ("link-products", ControlAction::Link),
    ("manage-products", ControlAction::Manage),
    ("add-products", ControlAction::Add),
];

/// Splits `text` into lowercase words, acronyms stay whole: `linkSKUProducts` yields `link`, `sku` and `products`.
pub fn words(text: &str) -> Vec<String> {
    text.to_snake_case()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn find_exclusion(text: &str) -> Option<&'static str> {
    let words = words(text);
    EXCLUSION_TERMS
        .iter()
        .copied()
        .find(|term| words.iter().any(|word| word == term))
}

pub fn find_action(text: &str) -> Option<ControlAction> {
    let words = words(text);
    ACTION_VERBS
        .iter()
        .find(|(_, verbs)| {
            verbs
                .iter()
                .any(|verb| words.iter().any(|word| word == verb))
        })
        .map(|(action, _)| *action)
}

pub fn mentions_product(text: &str) -> bool {
    words(text)
        .iter()
        .any(|word| PRODUCT_STEMS.iter().any(|stem| word.starts_with(stem)))
}

pub fn is_product_icon(marker: &str) -> bool {
    marker.contains('\u{1F4E6}')
        || words(marker)
            .iter()
            .any(|word| PRODUCT_ICONS.contains(&word.as_str()))
}

/// An explicit tag, matched exactly (ignoring case and surrounding whitespace).
pub fn declared_tag(declared_action: &str) -> Option<ControlAction> {
    let declared_action = declared_action.trim();
    DECLARED_TAGS
        .iter()
        .find(|(tag, _)| tag.eq_ignore_ascii_case(declared_action))
        .map(|(_, action)| *action)
}
