use crate::format::unformat_number;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One cost row of the materials list, kept as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialLine {
    pub name: String,
    pub unit_price: String,
    pub quantity: String,
}

/// In-progress gathering as the user is typing it. Every value is the raw
/// input text; numeric fields hold the ungrouped digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatheringForm {
    pub title: String,
    pub date: String,
    pub location: String,
    pub participant_count: String,
    pub fee_per_person: String,
    pub materials: Vec<MaterialLine>,
    pub venue_fee: String,
    pub platform_fee_percent: String,
    pub target_profit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    Title,
    Date,
    Location,
    ParticipantCount,
    FeePerPerson,
    VenueFee,
    PlatformFeePercent,
    TargetProfit,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::Title,
        FormField::Date,
        FormField::Location,
        FormField::ParticipantCount,
        FormField::FeePerPerson,
        FormField::VenueFee,
        FormField::PlatformFeePercent,
        FormField::TargetProfit,
    ];

    /// Input name used by the rendered form and the JSON API.
    pub fn key(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Date => "date",
            FormField::Location => "location",
            FormField::ParticipantCount => "participantCount",
            FormField::FeePerPerson => "feePerPerson",
            FormField::VenueFee => "venueFee",
            FormField::PlatformFeePercent => "platformFeePercent",
            FormField::TargetProfit => "targetProfit",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, FormField::Title | FormField::Date | FormField::Location)
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("unknown form field '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaterialField {
    Name,
    UnitPrice,
    Quantity,
}

impl MaterialField {
    pub const ALL: [MaterialField; 3] = [
        MaterialField::Name,
        MaterialField::UnitPrice,
        MaterialField::Quantity,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MaterialField::Name => "name",
            MaterialField::UnitPrice => "unitPrice",
            MaterialField::Quantity => "quantity",
        }
    }
}

impl FromStr for MaterialField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaterialField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| format!("unknown material field '{s}'"))
    }
}

impl GatheringForm {
    /// Replace one scalar field. Validation waits until calculation.
    pub fn set_field(&mut self, field: FormField, value: &str) {
        let value = if field.is_numeric() {
            unformat_number(value)
        } else {
            value.to_string()
        };
        let slot = match field {
            FormField::Title => &mut self.title,
            FormField::Date => &mut self.date,
            FormField::Location => &mut self.location,
            FormField::ParticipantCount => &mut self.participant_count,
            FormField::FeePerPerson => &mut self.fee_per_person,
            FormField::VenueFee => &mut self.venue_fee,
            FormField::PlatformFeePercent => &mut self.platform_fee_percent,
            FormField::TargetProfit => &mut self.target_profit,
        };
        *slot = value;
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Title => &self.title,
            FormField::Date => &self.date,
            FormField::Location => &self.location,
            FormField::ParticipantCount => &self.participant_count,
            FormField::FeePerPerson => &self.fee_per_person,
            FormField::VenueFee => &self.venue_fee,
            FormField::PlatformFeePercent => &self.platform_fee_percent,
            FormField::TargetProfit => &self.target_profit,
        }
    }

    pub fn add_material(&mut self) {
        self.materials.push(MaterialLine::default());
    }

    /// Out-of-range indices are ignored.
    pub fn remove_material(&mut self, index: usize) {
        if index < self.materials.len() {
            self.materials.remove(index);
        }
    }

    /// Out-of-range indices are ignored. Price and quantity are stored
    /// without grouping separators.
    pub fn update_material(&mut self, index: usize, field: MaterialField, value: &str) {
        let Some(line) = self.materials.get_mut(index) else {
            return;
        };
        match field {
            MaterialField::Name => line.name = value.to_string(),
            MaterialField::UnitPrice => line.unit_price = unformat_number(value),
            MaterialField::Quantity => line.quantity = unformat_number(value),
        }
    }

    pub fn reset(&mut self) {
        *self = GatheringForm::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_fields_are_stored_ungrouped() {
        let mut form = GatheringForm::default();
        form.set_field(FormField::FeePerPerson, "5,000");
        form.set_field(FormField::Title, "Book club, autumn");
        assert_eq!(form.fee_per_person, "5000");
        assert_eq!(form.title, "Book club, autumn");
        assert_eq!(form.field(FormField::FeePerPerson), "5000");
    }

    #[test]
    fn material_rows_keep_order() {
        let mut form = GatheringForm::default();
        form.add_material();
        form.add_material();
        form.update_material(0, MaterialField::Name, "paper");
        form.update_material(1, MaterialField::Name, "paint");
        form.update_material(1, MaterialField::UnitPrice, "12,000");
        form.update_material(1, MaterialField::Quantity, "3");

        assert_eq!(form.materials.len(), 2);
        assert_eq!(form.materials[0].name, "paper");
        assert_eq!(form.materials[0].unit_price, "");
        assert_eq!(form.materials[1].unit_price, "12000");
        assert_eq!(form.materials[1].quantity, "3");

        form.remove_material(0);
        assert_eq!(form.materials.len(), 1);
        assert_eq!(form.materials[0].name, "paint");
    }

    #[test]
    fn out_of_range_material_edits_are_ignored() {
        let mut form = GatheringForm::default();
        form.add_material();
        form.update_material(0, MaterialField::Name, "cups");
        let before = form.clone();

        form.remove_material(1);
        form.remove_material(usize::MAX);
        form.update_material(4, MaterialField::Quantity, "9");
        assert_eq!(form, before);
    }

    #[test]
    fn reset_clears_everything() {
        let mut form = GatheringForm::default();
        form.set_field(FormField::Title, "Picnic");
        form.set_field(FormField::TargetProfit, "45000");
        form.add_material();
        form.reset();
        assert_eq!(form, GatheringForm::default());
    }

    #[test]
    fn field_keys_round_trip() {
        for field in FormField::ALL {
            assert_eq!(field.key().parse::<FormField>(), Ok(field));
        }
        assert!("participants".parse::<FormField>().is_err());
        for field in MaterialField::ALL {
            assert_eq!(field.key().parse::<MaterialField>(), Ok(field));
        }
        assert!("price".parse::<MaterialField>().is_err());
    }
}
