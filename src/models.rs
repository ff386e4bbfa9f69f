//! Core data models used throughout the triage harness.
//!
//! These types represent the normalized knowledge-base records (algorithms,
//! clinical details, breed risks) and the pet profile that flows into the
//! context builder. Record fields serialize under the knowledge base's own
//! vocabulary (`nombre`, `especie`, ...) because the downstream prompt reads
//! them by those names.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Provenance tag assigned to an algorithm from the name of its source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlgorithmGroup {
    #[serde(rename = "geriatrico")]
    Geriatric,
    #[serde(rename = "t4")]
    T4,
    #[serde(rename = "anestesia")]
    Anesthesia,
    #[serde(rename = "familiar")]
    Familiar,
    #[default]
    #[serde(rename = "general")]
    General,
}

impl AlgorithmGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmGroup::Geriatric => "geriatrico",
            AlgorithmGroup::T4 => "t4",
            AlgorithmGroup::Anesthesia => "anestesia",
            AlgorithmGroup::Familiar => "familiar",
            AlgorithmGroup::General => "general",
        }
    }
}

/// A clinical decision-tree descriptor.
///
/// Only the fields the filter reads are typed; everything else found on the
/// source node is carried in `extra` and serialized back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmRecord {
    pub id: String,
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "nivelUsuario", default, skip_serializing_if = "Option::is_none")]
    pub user_level: Option<String>,
    /// Either a single species code or a list of them, as written in the source.
    #[serde(rename = "especie", default, skip_serializing_if = "Option::is_none")]
    pub species: Option<Value>,
    #[serde(rename = "esquema", default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<Value>,
    #[serde(rename = "grupo", default)]
    pub group: AlgorithmGroup,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AlgorithmRecord {
    /// Lowercased, trimmed user level; `None` when missing or blank.
    pub fn user_level_key(&self) -> Option<String> {
        self.user_level
            .as_deref()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
    }
}

/// Per-disease reference entry from the clinical details document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalDetailRecord {
    #[serde(rename = "id", default)]
    pub disease_id: Option<String>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    /// `perro`, `gato` or `perro_gato`.
    #[serde(rename = "especie", default)]
    pub species: Option<String>,
    #[serde(rename = "razasRiesgo", default)]
    pub risk_breeds: Vec<String>,
    #[serde(rename = "sintomasClave", default)]
    pub key_symptoms: String,
    #[serde(rename = "diagnosticoRelevante", default)]
    pub relevant_diagnostics: String,
}

/// Per-breed predisposition entry from the breed predispositions document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreedRiskRecord {
    #[serde(rename = "especie", default)]
    pub species: String,
    #[serde(rename = "raza", default)]
    pub breed: String,
    #[serde(rename = "predisposiciones", default)]
    pub predispositions: Vec<String>,
}

/// The normalized, in-memory knowledge base.
///
/// Serializes to the bundled asset format (`algorithms`, `clinicalDetails`,
/// `breedRisks`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBase {
    #[serde(default)]
    pub algorithms: Vec<AlgorithmRecord>,
    #[serde(default)]
    pub clinical_details: Vec<ClinicalDetailRecord>,
    #[serde(default)]
    pub breed_risks: Vec<BreedRiskRecord>,
    /// SHA-256 over the source documents, when the source can provide one.
    #[serde(skip)]
    pub fingerprint: Option<String>,
}

impl KnowledgeBase {
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty() && self.clinical_details.is_empty() && self.breed_risks.is_empty()
    }
}

/// Species code in the knowledge base's own vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesCode {
    Dog,
    Cat,
}

impl SpeciesCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeciesCode::Dog => "perro",
            SpeciesCode::Cat => "gato",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "perro" => Some(SpeciesCode::Dog),
            "gato" => Some(SpeciesCode::Cat),
            _ => None,
        }
    }
}

/// Species coverage of a clinical detail record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeciesScope {
    Only(SpeciesCode),
    Both,
}

impl SpeciesScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "perro_gato" => Some(SpeciesScope::Both),
            other => SpeciesCode::parse(other).map(SpeciesScope::Only),
        }
    }

    pub fn covers(&self, code: SpeciesCode) -> bool {
        match self {
            SpeciesScope::Both => true,
            SpeciesScope::Only(c) => *c == code,
        }
    }
}

/// Species selected on the pet card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Species {
    Dog,
    Cat,
    Rabbit,
    Ferret,
    Bird,
    Rodent,
    Reptile,
    Fish,
    Exotic,
    /// Any other non-empty value sent by a client; kept as-is.
    Other(String),
}

impl Species {
    /// Parse a species identifier. Blank input means "unset".
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim().to_lowercase();
        let species = match t.as_str() {
            "" => return None,
            "dog" => Species::Dog,
            "cat" => Species::Cat,
            "rabbit" => Species::Rabbit,
            "ferret" => Species::Ferret,
            "bird" => Species::Bird,
            "rodent" => Species::Rodent,
            "reptile" => Species::Reptile,
            "fish" => Species::Fish,
            "exotic" => Species::Exotic,
            _ => Species::Other(t),
        };
        Some(species)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Rabbit => "rabbit",
            Species::Ferret => "ferret",
            Species::Bird => "bird",
            Species::Rodent => "rodent",
            Species::Reptile => "reptile",
            Species::Fish => "fish",
            Species::Exotic => "exotic",
            Species::Other(s) => s,
        }
    }

    /// Knowledge-base code; only dogs and cats have breed and clinical data.
    pub fn code(&self) -> Option<SpeciesCode> {
        match self {
            Species::Dog => Some(SpeciesCode::Dog),
            Species::Cat => Some(SpeciesCode::Cat),
            _ => None,
        }
    }
}

impl Serialize for Species {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Pet profile as received from a client.
///
/// Built with [`PetProfile::from_value`], which never fails: anything
/// malformed is treated as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetProfile {
    pub id: Option<String>,
    pub name: Option<String>,
    pub species: Option<Species>,
    pub breed: Option<String>,
    pub sex: Option<Sex>,
    pub age_years: Option<f64>,
    pub neutered: bool,
    /// Language tag embedded in the profile by older clients.
    pub lang: Option<String>,
}

impl PetProfile {
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return PetProfile::default();
        };

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let sex = match str_field(obj, "sex").as_deref() {
            Some("male") => Some(Sex::Male),
            Some("female") => Some(Sex::Female),
            _ => None,
        };

        let age_years = obj
            .get("ageYears")
            .and_then(Value::as_f64)
            .filter(|a| a.is_finite() && *a >= 0.0);

        PetProfile {
            id,
            name: str_field(obj, "name"),
            species: str_field(obj, "species").and_then(|s| Species::parse(&s)),
            breed: str_field(obj, "breed"),
            sex,
            age_years,
            neutered: obj.get("neutered").map(truthy).unwrap_or(false),
            lang: str_field(obj, "lang"),
        }
    }
}

/// Trimmed, non-empty string field.
fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pet_from_empty_object() {
        let pet = PetProfile::from_value(&json!({}));
        assert_eq!(pet, PetProfile::default());
    }

    #[test]
    fn test_pet_from_non_object() {
        let pet = PetProfile::from_value(&json!("not a pet"));
        assert_eq!(pet, PetProfile::default());
    }

    #[test]
    fn test_pet_fields_are_trimmed_and_typed() {
        let pet = PetProfile::from_value(&json!({
            "id": 17,
            "name": "  Luna ",
            "species": "Dog",
            "breed": " lab ",
            "sex": "female",
            "ageYears": 8,
            "neutered": true,
            "lang": "es"
        }));
        assert_eq!(pet.id.as_deref(), Some("17"));
        assert_eq!(pet.name.as_deref(), Some("Luna"));
        assert_eq!(pet.species, Some(Species::Dog));
        assert_eq!(pet.breed.as_deref(), Some("lab"));
        assert_eq!(pet.sex, Some(Sex::Female));
        assert_eq!(pet.age_years, Some(8.0));
        assert!(pet.neutered);
        assert_eq!(pet.lang.as_deref(), Some("es"));
    }

    #[test]
    fn test_pet_rejects_bad_values() {
        let pet = PetProfile::from_value(&json!({
            "species": "",
            "sex": "unknown",
            "ageYears": -2,
            "neutered": 0
        }));
        assert_eq!(pet.species, None);
        assert_eq!(pet.sex, None);
        assert_eq!(pet.age_years, None);
        assert!(!pet.neutered);
    }

    #[test]
    fn test_age_must_be_a_number() {
        let pet = PetProfile::from_value(&json!({ "ageYears": "9" }));
        assert_eq!(pet.age_years, None);
    }

    #[test]
    fn test_species_codes() {
        assert_eq!(Species::Dog.code(), Some(SpeciesCode::Dog));
        assert_eq!(Species::Cat.code(), Some(SpeciesCode::Cat));
        assert_eq!(Species::Rabbit.code(), None);
        assert_eq!(Species::parse("hamster"), Some(Species::Other("hamster".into())));
    }

    #[test]
    fn test_species_scope() {
        let both = SpeciesScope::parse("perro_gato").unwrap();
        assert!(both.covers(SpeciesCode::Dog));
        assert!(both.covers(SpeciesCode::Cat));
        let cat = SpeciesScope::parse(" Gato ").unwrap();
        assert!(!cat.covers(SpeciesCode::Dog));
        assert!(SpeciesScope::parse("conejo").is_none());
    }

    #[test]
    fn test_algorithm_record_keeps_extra_fields() {
        let rec: AlgorithmRecord = serde_json::from_value(json!({
            "id": "vomiting_dog_01",
            "nombre": "Vómitos",
            "nivelUsuario": "familiar",
            "pagina": 12,
            "grupo": "geriatrico"
        }))
        .unwrap();
        assert_eq!(rec.group, AlgorithmGroup::Geriatric);
        assert_eq!(rec.extra.get("pagina"), Some(&json!(12)));

        let back = serde_json::to_value(&rec).unwrap();
        assert_eq!(back["pagina"], json!(12));
        assert_eq!(back["grupo"], json!("geriatrico"));
    }
}
