//! Deterministic names for stored documents and derived identifiers.
//!
//! Nothing here touches the filesystem. Every function is a pure mapping
//! from resource facts (fiscal year, sequence, owner, upload date) to the
//! name or key the bytes live under, so a name can be recomputed from the
//! database row alone.

use chrono::NaiveDate;

/// Longest slug kept from a client-supplied name.
pub const SLUG_MAX_LEN: usize = 60;

/// Slug used when the client-supplied name has no usable characters.
pub const FALLBACK_SLUG: &str = "document";

const EXTENSION_MAX_LEN: usize = 10;

/// Reduces arbitrary text to `[A-Za-z0-9_-]`, collapsing each run of other
/// characters into a single `_` and truncating to [`SLUG_MAX_LEN`].
#[must_use]
pub fn slug(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(SLUG_MAX_LEN));
    let mut in_run = false;
    for c in raw.chars() {
        if out.len() == SLUG_MAX_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    if out.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        out
    }
}

/// Lowercased extension of a client filename, leading dot included.
/// Returns an empty string when there is no plausible extension.
#[must_use]
pub fn file_extension(original_name: &str) -> String {
    split_name(original_name).1
}

/// Splits a client filename into (stem, normalized extension). The extension
/// only counts when the stem is non-empty and the suffix is short ASCII
/// alphanumeric text, so dotfiles and decorative dots stay in the stem.
fn split_name(original_name: &str) -> (&str, String) {
    if let Some((stem, ext)) = original_name.rsplit_once('.') {
        let plausible = !stem.is_empty()
            && !ext.is_empty()
            && ext.len() <= EXTENSION_MAX_LEN
            && ext.bytes().all(|b| b.is_ascii_alphanumeric());
        if plausible {
            return (stem, format!(".{}", ext.to_ascii_lowercase()));
        }
    }
    (original_name, String::new())
}

/// Business identifier of an expense account, e.g. `C2025-HABITEK007`.
#[must_use]
pub fn expense_account_cid(fiscal_year: i32, sequence: i64) -> String {
    format!("C{fiscal_year}-HABITEK{sequence:03}")
}

/// Directory invoice documents for one fiscal year live under.
#[must_use]
pub fn invoice_dir(fiscal_year: i32) -> String {
    format!("invoices/{fiscal_year}")
}

/// Directory expense-account documents for one fiscal year live under.
#[must_use]
pub fn expense_account_dir(fiscal_year: i32) -> String {
    format!("expense_accounts/{fiscal_year}")
}

/// Subdirectory for PDFs the system generates itself, kept apart from
/// client uploads of the same fiscal year.
#[must_use]
pub fn generated_dir(fiscal_year: i32) -> String {
    format!("expense_accounts/{fiscal_year}/generated")
}

/// Stored name for an invoice document:
/// `Habitek_{fy}-{seq}_{slug}_{YYYYMMDD}_{index}{ext}`.
#[must_use]
pub fn invoice_file_name(
    fiscal_year: i32,
    sequence: i64,
    original_name: &str,
    received_on: NaiveDate,
    file_index: i32,
) -> String {
    let (stem, ext) = split_name(original_name);
    format!(
        "Habitek_{fiscal_year}-{sequence}_{}_{}_{file_index:02}{ext}",
        slug(stem),
        received_on.format("%Y%m%d"),
    )
}

/// Stored name for an expense-account document:
/// `{cid}_{requester-slug}_{index}{ext}`.
#[must_use]
pub fn expense_account_file_name(
    cid: &str,
    requester_name: &str,
    original_name: &str,
    file_index: i32,
) -> String {
    let (_, ext) = split_name(original_name);
    format!("{cid}_{}_{file_index:02}{ext}", slug(requester_name))
}

/// Stored name for a system-generated expense-account PDF:
/// `{cid}_generated_{YYYYMMDD}.pdf`.
#[must_use]
pub fn generated_pdf_name(cid: &str, generated_on: NaiveDate) -> String {
    format!("{cid}_generated_{}.pdf", generated_on.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("Facture 2025", "Facture_2025")]
    #[case("déjà vu", "d_j_vu")]
    #[case("a  +  b", "a_b")]
    #[case("rapport-final_v2", "rapport-final_v2")]
    #[case("!!!", "_")]
    #[case("", "document")]
    fn slug_collapses_runs(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(slug(raw), expected);
    }

    #[test]
    fn slug_truncates_long_names() {
        let raw = "x".repeat(200);
        assert_eq!(slug(&raw).len(), SLUG_MAX_LEN);
    }

    #[rstest]
    #[case("scan.PDF", ".pdf")]
    #[case("archive.tar.gz", ".gz")]
    #[case("noext", "")]
    #[case(".bashrc", "")]
    #[case("weird.p@f", "")]
    #[case("trailing.", "")]
    fn extension_extraction(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(file_extension(name), expected);
    }

    #[test]
    fn cid_zero_pads_the_sequence() {
        assert_eq!(expense_account_cid(2025, 7), "C2025-HABITEK007");
        assert_eq!(expense_account_cid(2025, 123), "C2025-HABITEK123");
        assert_eq!(expense_account_cid(2025, 1234), "C2025-HABITEK1234");
    }

    #[test]
    fn invoice_names_are_fully_determined() {
        let name = invoice_file_name(2025, 7, "Facture café.PDF", date(2025, 9, 3), 1);
        assert_eq!(name, "Habitek_2025-7_Facture_caf__20250903_01.pdf");
    }

    #[test]
    fn expense_account_names_carry_cid_and_requester() {
        let name =
            expense_account_file_name("C2025-HABITEK007", "Marie-Ève Roy", "reçus.pdf", 2);
        assert_eq!(name, "C2025-HABITEK007_Marie-_ve_Roy_02.pdf");
    }

    #[test]
    fn generated_pdfs_live_in_their_own_directory() {
        assert_eq!(generated_dir(2025), "expense_accounts/2025/generated");
        assert_eq!(
            generated_pdf_name("C2025-HABITEK007", date(2025, 9, 3)),
            "C2025-HABITEK007_generated_20250903.pdf"
        );
    }

    proptest! {
        #[test]
        fn slug_output_is_always_storage_safe(raw in ".*") {
            let s = slug(&raw);
            prop_assert!(!s.is_empty());
            prop_assert!(s.len() <= SLUG_MAX_LEN);
            prop_assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }

        #[test]
        fn invoice_names_never_escape_their_directory(
            name in ".*",
            seq in 1i64..10_000,
            index in 1i32..100,
        ) {
            let file = invoice_file_name(2025, seq, &name, date(2025, 9, 3), index);
            prop_assert!(!file.contains('/'));
            prop_assert!(!file.contains(".."));
            prop_assert!(file.starts_with("Habitek_2025-"));
        }
    }
}
