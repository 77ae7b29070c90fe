//! Classification of raw HLA typing strings.
//!
//! | Raw typing       | Category       |
//! |------------------|----------------|
//! | `01:01:01:01`    | single allele  |
//! | `02:15N/02:32`   | allele string  |
//! | `01:01/02`       | allele string (subtype form, `01:01/01:02`) |
//! | `01:AB`          | NMDP code      |
//! | `01:XX`          | XX code        |
//! | `24`             | serology       |
//!
//! Locus prefixes such as `A*` are stripped before classification.

use thiserror::Error;

use crate::core::types::TypingCategory;
use crate::utils::validation::normalize_typing;

/// Expression suffixes recognised on the final field of an allele name
const EXPRESSION_SUFFIXES: [char; 6] = ['N', 'L', 'S', 'Q', 'C', 'A'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypingError {
    #[error("Empty typing")]
    Empty,

    #[error("Malformed typing '{0}'")]
    Malformed(String),
}

/// A parsed allele name such as `02:15N`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlleleName {
    fields: Vec<String>,
    suffix: Option<char>,
}

impl AlleleName {
    /// Parse a colon-delimited allele name with at least two fields
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split(':').collect();
        if parts.len() < 2 {
            return None;
        }

        let (last, leading) = parts.split_last()?;
        if !leading.iter().all(|f| is_numeric_field(f)) {
            return None;
        }

        let (last_field, suffix) = match last.chars().last() {
            Some(c) if EXPRESSION_SUFFIXES.contains(&c) => (&last[..last.len() - 1], Some(c)),
            _ => (*last, None),
        };
        if !is_numeric_field(last_field) {
            return None;
        }

        let mut fields: Vec<String> = leading.iter().map(|f| (*f).to_string()).collect();
        fields.push(last_field.to_string());
        Some(Self { fields, suffix })
    }

    /// Null alleles carry the `N` suffix
    pub fn is_null(&self) -> bool {
        self.suffix == Some('N')
    }

    pub fn has_suffix(&self) -> bool {
        self.suffix.is_some()
    }

    pub fn first_field(&self) -> &str {
        &self.fields[0]
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Fields joined without the expression suffix
    pub fn stem(&self) -> String {
        self.fields.join(":")
    }

    /// Whether the first `n` fields agree (a shorter name agrees on the fields it has)
    pub fn shares_fields(&self, other: &AlleleName, n: usize) -> bool {
        self.fields.iter().take(n).eq(other.fields.iter().take(n))
    }
}

impl std::fmt::Display for AlleleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.stem())?;
        if let Some(suffix) = self.suffix {
            write!(f, "{suffix}")?;
        }
        Ok(())
    }
}

fn is_numeric_field(field: &str) -> bool {
    !field.is_empty() && field.chars().all(|c| c.is_ascii_digit())
}

/// A raw typing broken down by shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedTyping {
    Allele(String),
    AlleleString(Vec<String>),
    NmdpCode { first_field: String, code: String },
    XxCode { first_field: String },
    Serology(String),
}

impl ParsedTyping {
    pub fn category(&self) -> TypingCategory {
        match self {
            Self::Allele(_) => TypingCategory::SingleAllele,
            Self::AlleleString(_) => TypingCategory::AlleleString,
            Self::NmdpCode { .. } => TypingCategory::NmdpCode,
            Self::XxCode { .. } => TypingCategory::XxCode,
            Self::Serology(_) => TypingCategory::Serology,
        }
    }
}

/// Classify a raw typing string
///
/// # Errors
///
/// Returns `TypingError::Empty` for blank input and `TypingError::Malformed`
/// when the string fits none of the known typing shapes.
pub fn parse_typing(raw: &str) -> Result<ParsedTyping, TypingError> {
    let name = normalize_typing(raw).ok_or(TypingError::Empty)?;
    let malformed = || TypingError::Malformed(raw.trim().to_string());

    if name.contains('/') {
        let first = name.split('/').next().unwrap_or_default();
        let first_field = AlleleName::parse(first)
            .map(|a| a.first_field().to_string())
            .ok_or_else(malformed)?;
        let members = expand_subtypes(&first_field, &name);
        if members.len() < 2 || members.iter().any(|m| AlleleName::parse(m).is_none()) {
            return Err(malformed());
        }
        return Ok(ParsedTyping::AlleleString(members));
    }

    if is_numeric_field(&name) {
        return Ok(ParsedTyping::Serology(name));
    }

    if let Some((first_field, code)) = name.split_once(':') {
        if is_numeric_field(first_field)
            && !code.is_empty()
            && code.chars().all(|c| c.is_ascii_uppercase())
        {
            // A lone trailing letter is an expression suffix, not a code
            if code == "XX" {
                return Ok(ParsedTyping::XxCode {
                    first_field: first_field.to_string(),
                });
            }
            if code.len() > 1 {
                return Ok(ParsedTyping::NmdpCode {
                    first_field: first_field.to_string(),
                    code: code.to_string(),
                });
            }
        }
    }

    AlleleName::parse(&name)
        .map(|_| ParsedTyping::Allele(name.clone()))
        .ok_or_else(malformed)
}

/// Expand a slash-delimited list where bare members are subtypes of `first_field`.
///
/// `expand_subtypes("01", "01/02:01/03")` gives `["01:01", "02:01", "01:03"]`.
pub fn expand_subtypes(first_field: &str, list: &str) -> Vec<String> {
    list.split('/')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|member| {
            if member.contains(':') {
                member.to_string()
            } else {
                format!("{first_field}:{member}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allele_name_parse() {
        let name = AlleleName::parse("02:15N").unwrap();
        assert!(name.is_null());
        assert_eq!(name.first_field(), "02");
        assert_eq!(name.stem(), "02:15");
        assert_eq!(name.to_string(), "02:15N");

        let full = AlleleName::parse("01:01:01:01").unwrap();
        assert!(!full.is_null());
        assert_eq!(full.field_count(), 4);

        let low = AlleleName::parse("24:02:01:02L").unwrap();
        assert!(!low.is_null());
        assert!(low.has_suffix());

        assert!(AlleleName::parse("01").is_none());
        assert!(AlleleName::parse("01:").is_none());
        assert!(AlleleName::parse("0x:01").is_none());
    }

    #[test]
    fn test_shares_fields() {
        let a = AlleleName::parse("01:01:01:01").unwrap();
        let b = AlleleName::parse("01:01:01:02").unwrap();
        let c = AlleleName::parse("01:01:02").unwrap();
        assert!(a.shares_fields(&b, 3));
        assert!(!a.shares_fields(&b, 4));
        assert!(a.shares_fields(&c, 2));
        assert!(!a.shares_fields(&c, 3));
    }

    #[test]
    fn test_parse_typing_categories() {
        let cases = [
            ("01:01:01:01", TypingCategory::SingleAllele),
            ("A*01:01", TypingCategory::SingleAllele),
            ("02:15N", TypingCategory::SingleAllele),
            ("02:15N/02:32", TypingCategory::AlleleString),
            ("01:01/02", TypingCategory::AlleleString),
            ("01:AB", TypingCategory::NmdpCode),
            ("01:XX", TypingCategory::XxCode),
            ("24", TypingCategory::Serology),
        ];
        for (raw, expected) in cases {
            let parsed = parse_typing(raw).unwrap();
            assert_eq!(parsed.category(), expected, "typing {raw}");
        }
    }

    #[test]
    fn test_parse_allele_string_subtypes() {
        let parsed = parse_typing("01:01/02/03:01").unwrap();
        assert_eq!(
            parsed,
            ParsedTyping::AlleleString(vec![
                "01:01".to_string(),
                "01:02".to_string(),
                "03:01".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_typing_rejects_garbage() {
        assert_eq!(parse_typing("   "), Err(TypingError::Empty));
        assert!(matches!(
            parse_typing("not-a-typing"),
            Err(TypingError::Malformed(_))
        ));
        assert!(matches!(parse_typing("01:01/"), Err(TypingError::Malformed(_))));
        assert!(matches!(parse_typing("ab:01"), Err(TypingError::Malformed(_))));
    }
}
