use crate::calc::{CalculationResult, FormPreview};
use crate::form::{FormField, GatheringForm, MaterialField};
use crate::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub field: FormField,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct MaterialUpdate {
    pub field: MaterialField,
    pub value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub form: GatheringForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CalculationResult>,
    pub history: Vec<HistoryEntry>,
    pub preview: FormPreview,
}

/// Button pressed on the HTML form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    Calculate,
    AddMaterial,
    RemoveMaterial(usize),
    Save,
    Reset,
}

impl FromStr for FormAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calculate" => Ok(FormAction::Calculate),
            "addMaterial" => Ok(FormAction::AddMaterial),
            "save" => Ok(FormAction::Save),
            "reset" => Ok(FormAction::Reset),
            other => other
                .strip_prefix("removeMaterial:")
                .and_then(|index| index.parse().ok())
                .map(FormAction::RemoveMaterial)
                .ok_or_else(|| format!("unknown action '{other}'")),
        }
    }
}

/// A url-encoded post of the whole form: every input plus the pressed
/// button. Unknown input names are ignored.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FormSubmission {
    pub fields: Vec<(FormField, String)>,
    pub materials: Vec<(usize, MaterialField, String)>,
    pub action: Option<FormAction>,
}

impl FormSubmission {
    pub fn parse(pairs: Vec<(String, String)>) -> Result<Self, String> {
        let mut submission = FormSubmission::default();
        for (key, value) in pairs {
            if key == "action" {
                submission.action = Some(value.parse()?);
            } else if let Ok(field) = key.parse::<FormField>() {
                submission.fields.push((field, value));
            } else if let Some((index, field)) = parse_material_key(&key) {
                submission.materials.push((index, field, value));
            }
        }
        Ok(submission)
    }

    pub fn apply_to(&self, form: &mut GatheringForm) {
        for (field, value) in &self.fields {
            form.set_field(*field, value);
        }
        for (index, field, value) in &self.materials {
            form.update_material(*index, *field, value);
        }
    }
}

/// `materials[2].unitPrice` -> `(2, UnitPrice)`
fn parse_material_key(key: &str) -> Option<(usize, MaterialField)> {
    let rest = key.strip_prefix("materials[")?;
    let (index, field) = rest.split_once("].")?;
    Some((index.parse().ok()?, field.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_actions() {
        assert_eq!("calculate".parse::<FormAction>(), Ok(FormAction::Calculate));
        assert_eq!("removeMaterial:3".parse::<FormAction>(), Ok(FormAction::RemoveMaterial(3)));
        assert!("removeMaterial:x".parse::<FormAction>().is_err());
        assert!("explode".parse::<FormAction>().is_err());
    }

    #[test]
    fn submission_updates_form_fields_and_rows() {
        let submission = FormSubmission::parse(pairs(&[
            ("title", "Picnic"),
            ("feePerPerson", "5,000"),
            ("materials[0].name", "cups"),
            ("materials[0].unitPrice", "1,200"),
            ("materials[7].quantity", "2"),
            ("materials[x].quantity", "2"),
            ("csrf", "ignored"),
            ("action", "addMaterial"),
        ]))
        .unwrap();
        assert_eq!(submission.action, Some(FormAction::AddMaterial));

        let mut form = GatheringForm::default();
        form.add_material();
        submission.apply_to(&mut form);

        assert_eq!(form.title, "Picnic");
        assert_eq!(form.fee_per_person, "5000");
        assert_eq!(form.materials.len(), 1);
        assert_eq!(form.materials[0].name, "cups");
        assert_eq!(form.materials[0].unit_price, "1200");
        assert_eq!(form.materials[0].quantity, "");
    }

    #[test]
    fn submission_rejects_unknown_action() {
        assert!(FormSubmission::parse(pairs(&[("action", "launch")])).is_err());
    }
}
