use serde::{Deserialize, Serialize};

/// An HLA locus considered for matching or scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Locus {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(rename = "DPB1", alias = "Dpb1", alias = "dpb1")]
    Dpb1,
    #[serde(rename = "DQB1", alias = "Dqb1", alias = "dqb1")]
    Dqb1,
    #[serde(rename = "DRB1", alias = "Drb1", alias = "drb1")]
    Drb1,
}

impl Locus {
    /// All loci, in output order
    pub const ALL: [Locus; 6] = [
        Locus::A,
        Locus::B,
        Locus::C,
        Locus::Dpb1,
        Locus::Dqb1,
        Locus::Drb1,
    ];

    /// Loci that every search must match on
    pub const MANDATORY: [Locus; 3] = [Locus::A, Locus::B, Locus::Drb1];

    /// Parse a locus name, accepting an optional `HLA-` prefix
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        let name = upper.strip_prefix("HLA-").unwrap_or(&upper);
        match name {
            "A" => Some(Locus::A),
            "B" => Some(Locus::B),
            "C" => Some(Locus::C),
            "DPB1" => Some(Locus::Dpb1),
            "DQB1" => Some(Locus::Dqb1),
            "DRB1" => Some(Locus::Drb1),
            _ => None,
        }
    }
}

impl std::fmt::Display for Locus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::Dpb1 => write!(f, "DPB1"),
            Self::Dqb1 => write!(f, "DQB1"),
            Self::Drb1 => write!(f, "DRB1"),
        }
    }
}

impl std::str::FromStr for Locus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown HLA locus '{s}'"))
    }
}

/// One of the two inherited copies at a locus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocusPosition {
    One,
    Two,
}

impl LocusPosition {
    pub const BOTH: [LocusPosition; 2] = [LocusPosition::One, LocusPosition::Two];

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl std::fmt::Display for LocusPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "1"),
            Self::Two => write!(f, "2"),
        }
    }
}

/// Kind of donor registered for search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonorType {
    Adult,
    Cord,
}

impl DonorType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "adult" | "a" => Some(DonorType::Adult),
            "cord" | "c" => Some(DonorType::Cord),
            _ => None,
        }
    }
}

impl std::fmt::Display for DonorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Adult => write!(f, "adult"),
            Self::Cord => write!(f, "cord"),
        }
    }
}

/// Shape of a raw typing, which bounds the best reachable grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingCategory {
    /// e.g. `01:01:01:01`, or a truncated name such as `01:01`
    SingleAllele,
    /// e.g. `02:15N/02:32` or `01:01/02`
    AlleleString,
    /// NMDP multiple allele code, e.g. `01:AB`
    NmdpCode,
    /// First-field-only code, e.g. `01:XX`
    XxCode,
    /// Serological antigen, e.g. `24`
    Serology,
}

impl TypingCategory {
    /// Whether grading may go finer than G-group for this typing
    #[must_use]
    pub fn is_allele_level(self) -> bool {
        matches!(self, Self::SingleAllele | Self::AlleleString)
    }
}

impl std::fmt::Display for TypingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleAllele => write!(f, "single allele"),
            Self::AlleleString => write!(f, "allele string"),
            Self::NmdpCode => write!(f, "NMDP code"),
            Self::XxCode => write!(f, "XX code"),
            Self::Serology => write!(f, "serology"),
        }
    }
}

/// Whether a typing is expressed at the cell surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionCategory {
    Expressing,
    /// Every candidate allele is a null allele
    Null,
    /// Ambiguous typing where some, but not all, candidates are null
    ExpressingWithPossibleNull,
}

impl ExpressionCategory {
    /// Derive the category from per-allele null flags
    pub fn from_null_flags(flags: impl IntoIterator<Item = bool>) -> Self {
        let (mut any_null, mut any_expressing) = (false, false);
        for is_null in flags {
            if is_null {
                any_null = true;
            } else {
                any_expressing = true;
            }
        }
        match (any_null, any_expressing) {
            (true, false) => Self::Null,
            (true, true) => Self::ExpressingWithPossibleNull,
            _ => Self::Expressing,
        }
    }
}

/// Quality of a position-level match.
///
/// Declared worst-first so that the derived ordering ranks better grades higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGrade {
    Mismatch,
    NullMismatch,
    ExpressingVsNull,
    NullPartial,
    NullCDna,
    NullGDna,
    PermissiveMismatch,
    PGroup,
    GGroup,
    Protein,
    CDna,
    GDna,
}

impl MatchGrade {
    /// Ordinal weight used for ranking, 0 (mismatch) to 11 (gDNA)
    #[must_use]
    pub fn weight(self) -> u32 {
        self as u32
    }

    /// Grades that record disagreement rather than a shared identity
    #[must_use]
    pub fn is_mismatch(self) -> bool {
        matches!(self, Self::Mismatch | Self::NullMismatch)
    }
}

impl std::fmt::Display for MatchGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mismatch => "Mismatch",
            Self::NullMismatch => "NullMismatch",
            Self::ExpressingVsNull => "ExpressingVsNull",
            Self::NullPartial => "NullPartial",
            Self::NullCDna => "NullCDna",
            Self::NullGDna => "NullGDna",
            Self::PermissiveMismatch => "PermissiveMismatch",
            Self::PGroup => "PGroup",
            Self::GGroup => "GGroup",
            Self::Protein => "Protein",
            Self::CDna => "CDna",
            Self::GDna => "GDna",
        };
        write!(f, "{name}")
    }
}

/// How certain a position-level grade is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    Mismatch,
    Potential,
    Exact,
    Definite,
}

impl MatchConfidence {
    #[must_use]
    pub fn weight(self) -> u32 {
        self as u32
    }
}

impl std::fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mismatch => write!(f, "Mismatch"),
            Self::Potential => write!(f, "Potential"),
            Self::Exact => write!(f, "Exact"),
            Self::Definite => write!(f, "Definite"),
        }
    }
}

/// Donor-level summary of the scored loci
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCategory {
    Mismatch,
    Potential,
    Exact,
    Definite,
}

impl From<MatchConfidence> for MatchCategory {
    fn from(confidence: MatchConfidence) -> Self {
        match confidence {
            MatchConfidence::Mismatch => Self::Mismatch,
            MatchConfidence::Potential => Self::Potential,
            MatchConfidence::Exact => Self::Exact,
            MatchConfidence::Definite => Self::Definite,
        }
    }
}

impl std::fmt::Display for MatchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mismatch => write!(f, "Mismatch"),
            Self::Potential => write!(f, "Potential"),
            Self::Exact => write!(f, "Exact"),
            Self::Definite => write!(f, "Definite"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locus_parse() {
        assert_eq!(Locus::parse("A"), Some(Locus::A));
        assert_eq!(Locus::parse("hla-drb1"), Some(Locus::Drb1));
        assert_eq!(Locus::parse(" DQB1 "), Some(Locus::Dqb1));
        assert_eq!(Locus::parse("DRB3"), None);
        assert_eq!("dpb1".parse::<Locus>(), Ok(Locus::Dpb1));
    }

    #[test]
    fn test_locus_serde_names() {
        let json = serde_json::to_string(&Locus::Drb1).unwrap();
        assert_eq!(json, "\"DRB1\"");
        let parsed: Locus = serde_json::from_str("\"Dqb1\"").unwrap();
        assert_eq!(parsed, Locus::Dqb1);
    }

    #[test]
    fn test_grade_ordering_best_first() {
        let best_to_worst = [
            MatchGrade::GDna,
            MatchGrade::CDna,
            MatchGrade::Protein,
            MatchGrade::GGroup,
            MatchGrade::PGroup,
            MatchGrade::PermissiveMismatch,
            MatchGrade::NullGDna,
            MatchGrade::NullCDna,
            MatchGrade::NullPartial,
            MatchGrade::ExpressingVsNull,
            MatchGrade::NullMismatch,
            MatchGrade::Mismatch,
        ];
        assert!(best_to_worst.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_typing_category_has_no_untyped_variant() {
        let parsed: TypingCategory = serde_json::from_str("\"nmdp_code\"").unwrap();
        assert_eq!(parsed, TypingCategory::NmdpCode);
        assert!(serde_json::from_str::<TypingCategory>("\"untyped\"").is_err());
    }

    #[test]
    fn test_mismatch_grades() {
        assert!(MatchGrade::Mismatch.is_mismatch());
        assert!(MatchGrade::NullMismatch.is_mismatch());
        assert!(!MatchGrade::PermissiveMismatch.is_mismatch());
        assert!(!MatchGrade::ExpressingVsNull.is_mismatch());
        assert!(!MatchGrade::NullPartial.is_mismatch());
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(MatchConfidence::Definite > MatchConfidence::Exact);
        assert!(MatchConfidence::Exact > MatchConfidence::Potential);
        assert!(MatchConfidence::Potential > MatchConfidence::Mismatch);
        assert_eq!(
            MatchCategory::from(MatchConfidence::Exact),
            MatchCategory::Exact
        );
    }

    #[test]
    fn test_expression_from_null_flags() {
        assert_eq!(
            ExpressionCategory::from_null_flags([false, false]),
            ExpressionCategory::Expressing
        );
        assert_eq!(
            ExpressionCategory::from_null_flags([true, true]),
            ExpressionCategory::Null
        );
        assert_eq!(
            ExpressionCategory::from_null_flags([true, false]),
            ExpressionCategory::ExpressingWithPossibleNull
        );
    }
}
