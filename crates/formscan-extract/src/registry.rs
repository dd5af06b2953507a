//! Declarative extraction rules and the compiled registry.
//!
//! A [`Catalog`] is plain data: explicit [`RuleSpec`]s plus the two name
//! lists (difficulty tasks, pain symptoms) from which one rule per name is
//! generated. [`PatternRegistry::from_catalog`] validates the catalog against
//! the schema and compiles every rule's label pattern.
//!
//! Label convention: `LABEL`, optional spaces or tabs, `:`, optional spaces or
//! tabs, then the value. Whitespace around the colon never crosses a line break.
//! Text values end at the next label of any rule in the registry, so several
//! fields may share a line. When a label repeats, the first occurrence whose
//! value fits the rule wins.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{FieldType, Group, DIFFICULTY_TASKS, PAIN_SYMPTOMS};
use formscan_core::{Error, Result};

/// Digit-width contract for numeric fields. Enforced by the pattern itself,
/// so a wider number simply fails to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NumericBound {
    /// A single digit from 0 to `max` (max <= 9).
    Scale { max: u8 },
    /// One to `digits` decimal digits.
    MaxDigits { digits: u8 },
    /// Any run of decimal digits.
    Unbounded,
}

impl NumericBound {
    fn capture(&self) -> String {
        match self {
            Self::Scale { max } => format!("([0-{}])", max),
            Self::MaxDigits { digits } => format!("([0-9]{{1,{}}})", digits),
            Self::Unbounded => "([0-9]+)".to_string(),
        }
    }
}

/// Shape of the value following a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Numeric { bound: NumericBound },
    /// Exactly `YES` or `NO`.
    Checkbox,
}

impl ValueKind {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text => FieldType::Text,
            Self::Numeric { .. } => FieldType::Integer,
            Self::Checkbox => FieldType::Checkbox,
        }
    }
}

/// Uncompiled description of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub group: Group,
    pub field_name: String,
    /// Literal label text as printed on the form.
    pub label: String,
    #[serde(flatten)]
    pub kind: ValueKind,
    #[serde(default)]
    pub multiline: bool,
}

impl RuleSpec {
    pub fn new(group: Group, field_name: &str, label: &str, kind: ValueKind) -> Self {
        Self {
            group,
            field_name: field_name.to_string(),
            label: label.to_string(),
            kind,
            multiline: false,
        }
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }
}

/// Derive a printed label from a field name: `putting_on_shoes` → `Putting On Shoes`.
pub fn title_label(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the numeric rule for a parametrized name (task or symptom).
pub fn rule_for_name(group: Group, name: &str, bound: NumericBound) -> RuleSpec {
    RuleSpec::new(group, name, &title_label(name), ValueKind::Numeric { bound })
}

/// Serializable rule catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
    /// Each name yields a `Scale { max: 5 }` rule in `difficulty_ratings`.
    #[serde(default)]
    pub difficulty_tasks: Vec<String>,
    /// Each name yields a `MaxDigits { digits: 2 }` rule in `pain_symptoms`.
    #[serde(default)]
    pub pain_symptoms: Vec<String>,
}

impl Catalog {
    pub const TASK_BOUND: NumericBound = NumericBound::Scale { max: 5 };
    pub const SYMPTOM_BOUND: NumericBound = NumericBound::MaxDigits { digits: 2 };

    /// The built-in catalog for the clinical assessment form.
    pub fn standard() -> Self {
        use Group::*;
        let text = ValueKind::Text;
        let count = ValueKind::Numeric {
            bound: NumericBound::Unbounded,
        };

        let rules = vec![
            RuleSpec::new(PatientDetails, "patient_name", "Patient Name", text),
            RuleSpec::new(PatientDetails, "dob", "DOB", text),
            RuleSpec::new(TreatmentDetails, "date", "Date", text),
            RuleSpec::new(TreatmentDetails, "injection", "INJECTION", ValueKind::Checkbox),
            RuleSpec::new(
                TreatmentDetails,
                "exercise_therapy",
                "Exercise Therapy",
                ValueKind::Checkbox,
            ),
            RuleSpec::new(
                PatientChanges,
                "since_last_treatment",
                "Patient changes since last treatment",
                text,
            )
            .multiline(),
            RuleSpec::new(
                PatientChanges,
                "since_start_of_treatment",
                "Patient changes since the start of treatment",
                text,
            )
            .multiline(),
            RuleSpec::new(
                PatientChanges,
                "last_3_days",
                "Describe any functional changes within the last three days (good or bad)",
                text,
            ),
            RuleSpec::new(MedicalAssistantData, "blood_pressure", "Blood Pressure", text),
            RuleSpec::new(MedicalAssistantData, "hr", "HR", count),
            RuleSpec::new(MedicalAssistantData, "weight", "Weight", count),
            RuleSpec::new(MedicalAssistantData, "height", "Height", text),
            RuleSpec::new(MedicalAssistantData, "spo2", "SpO2", count),
            RuleSpec::new(MedicalAssistantData, "temperature", "Temperature", text),
            RuleSpec::new(MedicalAssistantData, "blood_glucose", "Blood Glucose", count),
            RuleSpec::new(MedicalAssistantData, "respirations", "Respirations", count),
        ];

        Self {
            rules,
            difficulty_tasks: DIFFICULTY_TASKS.iter().map(|s| s.to_string()).collect(),
            pain_symptoms: PAIN_SYMPTOMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Explicit rules followed by the rules generated from the name lists.
    pub fn expand(&self) -> Vec<RuleSpec> {
        let tasks = self
            .difficulty_tasks
            .iter()
            .map(|name| rule_for_name(Group::DifficultyRatings, name, Self::TASK_BOUND));
        let symptoms = self
            .pain_symptoms
            .iter()
            .map(|name| rule_for_name(Group::PainSymptoms, name, Self::SYMPTOM_BOUND));

        self.rules.iter().cloned().chain(tasks).chain(symptoms).collect()
    }
}

/// A compiled rule. Capture group 1 of `pattern` is the raw value region.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    field_name: String,
    label: String,
    kind: ValueKind,
    multiline: bool,
    pattern: Regex,
}

impl ExtractionRule {
    /// Validate a spec's shape and compile its pattern.
    pub fn compile(spec: &RuleSpec) -> Result<Self> {
        let label = spec.label.trim();
        if label.is_empty() {
            return Err(Error::Config(format!(
                "{}.{}: label is empty",
                spec.group, spec.field_name
            )));
        }
        match spec.kind {
            ValueKind::Numeric {
                bound: NumericBound::Scale { max },
            } if max > 9 => {
                return Err(Error::Config(format!(
                    "{}.{}: scale maximum {} does not fit one digit",
                    spec.group, spec.field_name, max
                )));
            }
            ValueKind::Numeric {
                bound: NumericBound::MaxDigits { digits: 0 },
            } => {
                return Err(Error::Config(format!(
                    "{}.{}: digit width must be at least 1",
                    spec.group, spec.field_name
                )));
            }
            _ => {}
        }
        if spec.multiline && spec.kind != ValueKind::Text {
            return Err(Error::Config(format!(
                "{}.{}: only text fields may be multiline",
                spec.group, spec.field_name
            )));
        }

        let source = label_pattern(label, spec.kind, spec.multiline);
        let pattern = Regex::new(&source).map_err(|e| {
            Error::Config(format!("{}.{}: {}", spec.group, spec.field_name, e))
        })?;

        Ok(Self {
            field_name: spec.field_name.clone(),
            label: label.to_string(),
            kind: spec.kind,
            multiline: spec.multiline,
            pattern,
        })
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn multiline(&self) -> bool {
        self.multiline
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

fn label_prefix(label: &str) -> String {
    // A leading \b only makes sense when the label starts with a word character.
    let boundary = if label.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        r"\b"
    } else {
        ""
    };
    format!("{}{}", boundary, regex::escape(label))
}

fn label_pattern(label: &str, kind: ValueKind, multiline: bool) -> String {
    let prefix = format!(r"{}[ \t]*:[ \t]*", label_prefix(label));

    let value = match kind {
        ValueKind::Text if multiline => r"((?s:.*))".to_string(),
        ValueKind::Text => r"([^\r\n]*)".to_string(),
        // Width limits only bind bounded numbers; `HR : 76bpm` still reads 76.
        ValueKind::Numeric {
            bound: NumericBound::Unbounded,
        } => NumericBound::Unbounded.capture(),
        ValueKind::Numeric { bound } => format!(r"{}\b", bound.capture()),
        ValueKind::Checkbox => r"(YES|NO)\b".to_string(),
    };

    format!("{}{}", prefix, value)
}

/// Compiled rules grouped by schema group. Immutable once built.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    groups: Vec<(Group, Vec<ExtractionRule>)>,
    /// Any label followed by its colon. `None` for an empty registry.
    field_boundary: Option<Regex>,
}

static STANDARD: Lazy<PatternRegistry> = Lazy::new(|| {
    PatternRegistry::from_catalog(&Catalog::standard()).expect("built-in catalog is valid")
});

impl PatternRegistry {
    /// The built-in registry, compiled on first use.
    pub fn standard() -> &'static PatternRegistry {
        &STANDARD
    }

    /// Validate a catalog against the schema and compile it.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self> {
        let mut groups: Vec<(Group, Vec<ExtractionRule>)> =
            Group::ALL.iter().map(|g| (*g, Vec::new())).collect();
        let mut seen: HashSet<(Group, String)> = HashSet::new();

        for spec in catalog.expand() {
            let expected = spec.group.field_type(&spec.field_name).ok_or_else(|| {
                Error::Config(format!(
                    "{}.{}: not a field of this group",
                    spec.group, spec.field_name
                ))
            })?;
            if spec.kind.field_type() != expected {
                return Err(Error::Config(format!(
                    "{}.{}: rule yields {:?} but the schema expects {:?}",
                    spec.group,
                    spec.field_name,
                    spec.kind.field_type(),
                    expected
                )));
            }
            if !seen.insert((spec.group, spec.field_name.clone())) {
                return Err(Error::Config(format!(
                    "{}.{}: duplicate field name",
                    spec.group, spec.field_name
                )));
            }

            let rule = ExtractionRule::compile(&spec)?;
            if let Some((_, rules)) = groups.iter_mut().find(|(g, _)| *g == spec.group) {
                rules.push(rule);
            }
        }

        let prefixes: Vec<String> = groups
            .iter()
            .flat_map(|(_, rules)| rules.iter())
            .map(|rule| label_prefix(rule.label()))
            .collect();
        let field_boundary = if prefixes.is_empty() {
            None
        } else {
            let source = format!(r"(?:{})[ \t]*:", prefixes.join("|"));
            Some(Regex::new(&source).map_err(|e| {
                Error::Config(format!("field boundary pattern: {}", e))
            })?)
        };

        debug!("Pattern registry compiled: {} rules", seen.len());
        Ok(Self {
            groups,
            field_boundary,
        })
    }

    /// Load and compile a JSON catalog from disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("catalog {}: {}", path.display(), e)))?;
        let catalog: Catalog = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("catalog {}: {}", path.display(), e)))?;
        Self::from_catalog(&catalog)
    }

    /// Rules of one group, in catalog order.
    pub fn rules_for_group(&self, group: Group) -> &[ExtractionRule] {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, rules)| rules.as_slice())
            .unwrap_or(&[])
    }

    /// Every rule with its group, groups in schema order.
    pub fn rules(&self) -> impl Iterator<Item = (Group, &ExtractionRule)> {
        self.groups
            .iter()
            .flat_map(|(g, rules)| rules.iter().map(move |r| (*g, r)))
    }

    /// Matches the start of any field (label and colon) in the registry.
    pub fn field_boundary(&self) -> Option<&Regex> {
        self.field_boundary.as_ref()
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, rules)| rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
