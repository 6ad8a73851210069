//! Status label normalization.
//!
//! The admin UI sends human labels ("Em Reparo", "Aguardando Peças") while the
//! database only stores canonical codes. [`normalize_status`] maps one to the
//! other and passes anything unrecognized through untouched; write paths use
//! [`parse_status`] to reject what is still not canonical.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::entities::OrderStatus;

const LABELS: &[(&str, &str)] = &[
    ("recebido", "aguardando"),
    ("em analise", "em_andamento"),
    ("em reparo", "em_andamento"),
    ("aguardando pecas", "aguardando_peca"),
    ("aguardando peca", "aguardando_peca"),
    ("pronto", "pronto"),
    ("entregue", "entregue"),
    ("cancelado", "cancelado"),
];

/// Lower-cases, trims and strips diacritics.
fn fold_label(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Maps a free-form status label to its canonical code.
///
/// Returns `input` unchanged when no canonical code matches.
#[must_use]
pub fn normalize_status(input: &str) -> String {
    let folded = fold_label(input);
    if folded.is_empty() {
        return input.to_string();
    }

    if let Some((_, code)) = LABELS.iter().find(|(label, _)| *label == folded) {
        return (*code).to_string();
    }

    let candidate = folded.split_whitespace().collect::<Vec<_>>().join("_");
    match OrderStatus::from_code(&candidate) {
        Some(status) => status.as_str().to_string(),
        None => input.to_string(),
    }
}

/// Normalizes `input` and resolves it to a status, `None` when not canonical.
pub fn parse_status(input: &str) -> Option<OrderStatus> {
    OrderStatus::from_code(&normalize_status(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Recebido", "aguardando")]
    #[case("Em Análise", "em_andamento")]
    #[case("em analise", "em_andamento")]
    #[case("Em Reparo", "em_andamento")]
    #[case("Aguardando Peças", "aguardando_peca")]
    #[case("aguardando peca", "aguardando_peca")]
    #[case("  PRONTO ", "pronto")]
    #[case("Entregue", "entregue")]
    #[case("Cancelado", "cancelado")]
    #[case("Em   Andamento", "em_andamento")]
    #[case("aguardando_peca", "aguardando_peca")]
    fn ui_labels_map_to_codes(#[case] label: &str, #[case] expected: &str) {
        assert_eq!(normalize_status(label), expected);
    }

    #[rstest]
    #[case("xyz")]
    #[case("Em Espera")]
    #[case("")]
    #[case("   ")]
    fn unrecognized_labels_pass_through(#[case] label: &str) {
        assert_eq!(normalize_status(label), label);
        assert_eq!(parse_status(label), None);
    }

    #[test]
    fn canonical_codes_are_fixed_points() {
        for status in OrderStatus::ALL {
            assert_eq!(normalize_status(status.as_str()), status.as_str());
            assert_eq!(parse_status(status.as_str()), Some(status));
        }
    }
}
