//! Per-request context building.
//!
//! [`build_context`] is a pure function of the knowledge base and one
//! request: it filters algorithms by user level, gates geriatric content on
//! the pet's age, matches breed risks (with alias expansion) and clinical
//! details by species, and assembles a [`ContextPayload`].
//!
//! [`ContextBuilder`] wraps it for the request handlers: it resolves the
//! language, makes sure the cache is loaded, and turns any failure into an
//! `{ "error", "details" }` payload instead of returning an error.
//!
//! # Payload
//!
//! ```json
//! {
//!   "pet": { "id", "name", "species", "breed", "sex", "ageYears", "neutered",
//!            "speciesI18nKey", "sexKey" },
//!   "userLang": "es",
//!   "symptomKeys": ["vomiting"],
//!   "nivelUsuario": "familiar",
//!   "algorithms": [...],
//!   "clinical_details_for_species": [...],
//!   "breed_risks_for_pet": [...],
//!   "knowledgeBase": [...],
//!   "context": "..."
//! }
//! ```

use anyhow::{Context as _, Result};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

use crate::breeds::{breed_candidates, normalize_breed};
use crate::cache::KnowledgeBaseCache;
use crate::config::ContextConfig;
use crate::models::{
    AlgorithmGroup, AlgorithmRecord, BreedRiskRecord, ClinicalDetailRecord, KnowledgeBase,
    PetProfile, Sex, Species, SpeciesCode, SpeciesScope,
};

/// User-level filter value that keeps every algorithm with a level.
pub const ALL_LEVELS: &str = "all";

/// Pets at or above this age get geriatric algorithms, listed first.
pub const SENIOR_AGE_YEARS: f64 = 7.0;

pub const FALLBACK_LANG: &str = "en";

/// Pet profile as written into the payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPet {
    pub id: Option<String>,
    pub name: Option<String>,
    pub species: Option<Species>,
    pub breed: Option<String>,
    pub sex: Option<Sex>,
    #[serde(rename = "ageYears", serialize_with = "serialize_age")]
    pub age_years: Option<f64>,
    pub neutered: bool,
    #[serde(rename = "speciesI18nKey")]
    pub species_i18n_key: Option<String>,
    #[serde(rename = "sexKey")]
    pub sex_key: &'static str,
}

impl NormalizedPet {
    pub fn from_profile(pet: &PetProfile) -> Self {
        Self {
            id: pet.id.clone(),
            name: pet.name.clone(),
            species: pet.species.clone(),
            breed: pet.breed.clone(),
            sex: pet.sex,
            age_years: pet.age_years,
            neutered: pet.neutered,
            species_i18n_key: species_i18n_key(pet.species.as_ref(), pet.sex),
            sex_key: sex_key(pet.sex),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextPayload<'a> {
    pub pet: NormalizedPet,
    #[serde(rename = "userLang")]
    pub user_lang: String,
    #[serde(rename = "symptomKeys")]
    pub symptom_keys: Vec<String>,
    #[serde(rename = "nivelUsuario")]
    pub user_level: String,
    pub algorithms: Vec<&'a AlgorithmRecord>,
    pub clinical_details_for_species: Vec<&'a ClinicalDetailRecord>,
    pub breed_risks_for_pet: Vec<&'a BreedRiskRecord>,
    /// Older prompt versions read the algorithm list from this field.
    #[serde(rename = "knowledgeBase")]
    pub legacy_algorithms: Vec<&'a AlgorithmRecord>,
    pub context: String,
}

pub fn build_context<'a>(
    kb: &'a KnowledgeBase,
    pet: &PetProfile,
    symptom_keys: &[String],
    lang: &str,
    user_level: &str,
) -> ContextPayload<'a> {
    let normalized = NormalizedPet::from_profile(pet);
    let code = pet.species.as_ref().and_then(Species::code);

    let by_level = filter_by_user_level(&kb.algorithms, user_level);
    let algorithms = order_for_age(by_level, pet.age_years);
    let breed_risks = breed_risks_for_pet(&kb.breed_risks, code, pet.breed.as_deref());
    let clinical_details = clinical_details_for_species(&kb.clinical_details, code);

    debug!(
        user_level,
        algorithms = algorithms.len(),
        clinical_details = clinical_details.len(),
        breed_risks = breed_risks.len(),
        "context filtered"
    );

    let context = summary_text(&normalized, lang, symptom_keys);

    ContextPayload {
        pet: normalized,
        user_lang: lang.to_string(),
        symptom_keys: symptom_keys.to_vec(),
        user_level: user_level.to_string(),
        legacy_algorithms: algorithms.clone(),
        algorithms,
        clinical_details_for_species: clinical_details,
        breed_risks_for_pet: breed_risks,
        context,
    }
}

/// Keep algorithms whose user level equals `filter` (case-insensitive), or
/// every algorithm that has a level when `filter` is exactly `"all"` after
/// trimming. Algorithms without a level never pass.
pub fn filter_by_user_level<'a>(
    algorithms: &'a [AlgorithmRecord],
    filter: &str,
) -> Vec<&'a AlgorithmRecord> {
    let all = filter.trim() == ALL_LEVELS;
    let filter = filter.trim().to_lowercase();
    algorithms
        .iter()
        .filter(|alg| match alg.user_level_key() {
            None => false,
            Some(_) if all => true,
            Some(level) => level == filter,
        })
        .collect()
}

/// Senior pets get geriatric algorithms first; everyone else gets none.
/// Relative order inside each partition is kept.
pub fn order_for_age(
    algorithms: Vec<&AlgorithmRecord>,
    age_years: Option<f64>,
) -> Vec<&AlgorithmRecord> {
    let (geriatric, others): (Vec<_>, Vec<_>) = algorithms
        .into_iter()
        .partition(|alg| alg.group == AlgorithmGroup::Geriatric);

    match age_years {
        Some(age) if age >= SENIOR_AGE_YEARS => geriatric.into_iter().chain(others).collect(),
        _ => others,
    }
}

pub fn breed_risks_for_pet<'a>(
    records: &'a [BreedRiskRecord],
    code: Option<SpeciesCode>,
    breed: Option<&str>,
) -> Vec<&'a BreedRiskRecord> {
    let Some(code) = code else {
        return Vec::new();
    };
    let candidates = breed_candidates(breed.unwrap_or_default(), Some(code));
    if candidates.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| SpeciesCode::parse(&r.species) == Some(code))
        .filter(|r| candidates.contains(&normalize_breed(&r.breed)))
        .collect()
}

pub fn clinical_details_for_species(
    records: &[ClinicalDetailRecord],
    code: Option<SpeciesCode>,
) -> Vec<&ClinicalDetailRecord> {
    let Some(code) = code else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| {
            r.species
                .as_deref()
                .and_then(SpeciesScope::parse)
                .is_some_and(|scope| scope.covers(code))
        })
        .collect()
}

/// Locale key for the species label: dogs and cats are split by sex, other
/// species use `animal_<species>` directly.
pub fn species_i18n_key(species: Option<&Species>, sex: Option<Sex>) -> Option<String> {
    let species = species?;
    let key = match (species, sex) {
        (Species::Dog | Species::Cat, Some(sex)) => {
            format!("animal_{}_{}", species.as_str(), sex.as_str())
        }
        _ => format!("animal_{}", species.as_str()),
    };
    Some(key)
}

pub fn sex_key(sex: Option<Sex>) -> &'static str {
    sex.map(|s| s.as_str()).unwrap_or("unknown")
}

/// First non-blank of: request tag, pet tag, configured default, `"en"`.
pub fn resolve_lang(requested: Option<&str>, pet: &PetProfile, default: Option<&str>) -> String {
    [requested, pet.lang.as_deref(), default]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(FALLBACK_LANG)
        .to_string()
}

pub fn language_name(lang: &str) -> &str {
    match lang {
        "es" => "Español",
        "en" => "English",
        "ru" => "Русский",
        "he" => "עברית",
        "de" => "Deutsch",
        "fr" => "Français",
        "it" => "Italiano",
        other => other,
    }
}

fn summary_text(pet: &NormalizedPet, lang: &str, symptom_keys: &[String]) -> String {
    let symptoms = if symptom_keys.is_empty() {
        "No se han indicado síntomas específicos.".to_string()
    } else {
        format!("Síntomas reportados: {}.", symptom_keys.join(", "))
    };

    let age = pet
        .age_years
        .map(|a| format!("{} años", format_age(a)))
        .unwrap_or_else(|| "Sin datos".to_string());

    format!(
        "Contexto clínico del paciente:\n\
         Nombre: {}\n\
         EspecieKey: {}\n\
         SpeciesI18nKey: {}\n\
         SexoKey: {}\n\
         Raza: {}\n\
         Edad: {}\n\
         Esterilizado: {}\n\
         \n\
         Idioma del usuario: {}\n\
         {}",
        pet.name.as_deref().unwrap_or("Desconocido"),
        pet.species.as_ref().map(Species::as_str).unwrap_or("-"),
        pet.species_i18n_key.as_deref().unwrap_or("-"),
        pet.sex_key,
        pet.breed.as_deref().unwrap_or("No especificada"),
        age,
        if pet.neutered { "Sí" } else { "No" },
        language_name(lang),
        symptoms
    )
}

fn format_age(age: f64) -> String {
    if age.fract() == 0.0 && age.abs() < i64::MAX as f64 {
        format!("{}", age as i64)
    } else {
        format!("{}", age)
    }
}

fn serialize_age<S: Serializer>(age: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match age {
        Some(a) if a.fract() == 0.0 && a.abs() < i64::MAX as f64 => {
            serializer.serialize_i64(*a as i64)
        }
        Some(a) => serializer.serialize_f64(*a),
        None => serializer.serialize_none(),
    }
}

/// Request-facing wrapper around [`build_context`].
#[derive(Clone)]
pub struct ContextBuilder {
    cache: Arc<KnowledgeBaseCache>,
    default_lang: Option<String>,
    default_user_level: String,
}

impl ContextBuilder {
    pub fn new(cache: Arc<KnowledgeBaseCache>, config: &ContextConfig) -> Self {
        Self {
            cache,
            default_lang: config.default_lang.clone(),
            default_user_level: config.user_level.clone(),
        }
    }

    pub fn cache(&self) -> &Arc<KnowledgeBaseCache> {
        &self.cache
    }

    pub fn default_lang(&self) -> Option<&str> {
        self.default_lang.as_deref()
    }

    pub fn default_user_level(&self) -> &str {
        &self.default_user_level
    }

    /// Build the payload for a raw pet object. Never fails: errors come back
    /// as `{ "error", "details" }`.
    pub async fn build_json(
        &self,
        pet: &Value,
        symptom_keys: &[String],
        lang: Option<&str>,
        user_level: Option<&str>,
    ) -> Value {
        match self.try_build(pet, symptom_keys, lang, user_level).await {
            Ok(value) => value,
            Err(e) => {
                error!(error = %format!("{:#}", e), "context build failed");
                json!({
                    "error": "Failed to build clinical context.",
                    "details": format!("{:#}", e),
                })
            }
        }
    }

    /// Same as [`ContextBuilder::build_json`], serialized.
    pub async fn build(
        &self,
        pet: &Value,
        symptom_keys: &[String],
        lang: Option<&str>,
        user_level: Option<&str>,
    ) -> String {
        self.build_json(pet, symptom_keys, lang, user_level)
            .await
            .to_string()
    }

    async fn try_build(
        &self,
        pet: &Value,
        symptom_keys: &[String],
        lang: Option<&str>,
        user_level: Option<&str>,
    ) -> Result<Value> {
        let profile = PetProfile::from_value(pet);
        let lang = resolve_lang(lang, &profile, self.default_lang.as_deref());
        let user_level = user_level
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.default_user_level.as_str());

        let kb = self.cache.load().await;
        let payload = build_context(&kb, &profile, symptom_keys, &lang, user_level);
        serde_json::to_value(&payload).context("Failed to serialize context payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::BundleKnowledgeSource;
    use serde_json::Map;

    fn alg(id: &str, level: Option<&str>, group: AlgorithmGroup) -> AlgorithmRecord {
        AlgorithmRecord {
            id: id.to_string(),
            name: Some(id.to_uppercase()),
            user_level: level.map(str::to_string),
            species: None,
            schema: Vec::new(),
            group,
            extra: Map::new(),
        }
    }

    fn clinical(id: &str, species: &str) -> ClinicalDetailRecord {
        ClinicalDetailRecord {
            disease_id: Some(id.to_string()),
            species: Some(species.to_string()),
            ..ClinicalDetailRecord::default()
        }
    }

    fn breed(species: &str, name: &str) -> BreedRiskRecord {
        BreedRiskRecord {
            species: species.to_string(),
            breed: name.to_string(),
            predispositions: vec!["Obesidad".to_string()],
        }
    }

    fn sample_kb() -> KnowledgeBase {
        KnowledgeBase {
            algorithms: vec![
                alg("general_vomiting", Some("familiar"), AlgorithmGroup::General),
                alg("senior_weakness", Some("Familiar"), AlgorithmGroup::Geriatric),
                alg("pro_anesthesia", Some("professional"), AlgorithmGroup::Anesthesia),
                alg("no_level", None, AlgorithmGroup::General),
                alg("blank_level", Some("  "), AlgorithmGroup::General),
            ],
            clinical_details: vec![
                clinical("both", "perro_gato"),
                clinical("cat_only", "gato"),
                clinical("dog_only", "Perro"),
                clinical("unknown", "conejo"),
            ],
            breed_risks: vec![
                breed("perro", "labrador retriever"),
                breed("perro", "Boxer"),
                breed("gato", "Persa"),
                breed("perro", ""),
            ],
            fingerprint: None,
        }
    }

    fn pet(value: Value) -> PetProfile {
        PetProfile::from_value(&value)
    }

    fn ids(algs: &[&AlgorithmRecord]) -> Vec<String> {
        algs.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_senior_pet_gets_geriatric_first() {
        let kb = sample_kb();
        let p = pet(json!({ "species": "dog", "ageYears": 8 }));
        let payload = build_context(&kb, &p, &[], "en", "familiar");
        assert_eq!(
            ids(&payload.algorithms),
            vec!["senior_weakness", "general_vomiting"]
        );
    }

    #[test]
    fn test_young_pet_gets_no_geriatric() {
        let kb = sample_kb();
        let p = pet(json!({ "species": "dog", "ageYears": 3 }));
        let payload = build_context(&kb, &p, &[], "en", "familiar");
        assert_eq!(ids(&payload.algorithms), vec!["general_vomiting"]);
        assert_eq!(ids(&payload.legacy_algorithms), vec!["general_vomiting"]);
    }

    #[test]
    fn test_unknown_age_gets_no_geriatric() {
        let kb = sample_kb();
        let payload = build_context(&kb, &PetProfile::default(), &[], "en", "familiar");
        assert_eq!(ids(&payload.algorithms), vec!["general_vomiting"]);
    }

    #[test]
    fn test_age_boundary_is_inclusive() {
        let kb = sample_kb();
        let p = pet(json!({ "ageYears": 7 }));
        let payload = build_context(&kb, &p, &[], "en", "familiar");
        assert_eq!(payload.algorithms[0].id, "senior_weakness");
    }

    #[test]
    fn test_user_level_filter() {
        let kb = sample_kb();
        assert_eq!(
            ids(&filter_by_user_level(&kb.algorithms, "PROFESSIONAL")),
            vec!["pro_anesthesia"]
        );
        assert_eq!(
            ids(&filter_by_user_level(&kb.algorithms, "all")),
            vec!["general_vomiting", "senior_weakness", "pro_anesthesia"]
        );
        assert_eq!(filter_by_user_level(&kb.algorithms, " all ").len(), 3);
        assert!(filter_by_user_level(&kb.algorithms, "ALL").is_empty());
        assert!(filter_by_user_level(&kb.algorithms, "vet").is_empty());
    }

    #[test]
    fn test_missing_user_level_never_passes() {
        let kb = sample_kb();
        for filter in ["familiar", "professional", "all", ""] {
            let kept = filter_by_user_level(&kb.algorithms, filter);
            assert!(
                kept.iter().all(|a| a.id != "no_level" && a.id != "blank_level"),
                "filter {:?} leaked an algorithm without level",
                filter
            );
        }
    }

    #[test]
    fn test_breed_alias_matching() {
        let kb = sample_kb();
        let p = pet(json!({ "species": "dog", "breed": "lab" }));
        let payload = build_context(&kb, &p, &[], "en", "familiar");
        assert_eq!(payload.breed_risks_for_pet.len(), 1);
        assert_eq!(payload.breed_risks_for_pet[0].breed, "labrador retriever");
    }

    #[test]
    fn test_breed_requires_matching_species() {
        let kb = sample_kb();
        let p = pet(json!({ "species": "cat", "breed": "Boxer" }));
        assert!(build_context(&kb, &p, &[], "en", "familiar")
            .breed_risks_for_pet
            .is_empty());
        let p = pet(json!({ "species": "cat", "breed": "persa" }));
        assert_eq!(
            build_context(&kb, &p, &[], "en", "familiar").breed_risks_for_pet.len(),
            1
        );
    }

    #[test]
    fn test_no_breed_matches_nothing() {
        let kb = sample_kb();
        let p = pet(json!({ "species": "dog" }));
        assert!(build_context(&kb, &p, &[], "en", "familiar")
            .breed_risks_for_pet
            .is_empty());
    }

    #[test]
    fn test_clinical_details_by_species() {
        let kb = sample_kb();
        let dog = clinical_details_for_species(&kb.clinical_details, Some(SpeciesCode::Dog));
        let dog_ids: Vec<_> = dog.iter().map(|c| c.disease_id.clone().unwrap()).collect();
        assert_eq!(dog_ids, vec!["both", "dog_only"]);

        let cat = clinical_details_for_species(&kb.clinical_details, Some(SpeciesCode::Cat));
        let cat_ids: Vec<_> = cat.iter().map(|c| c.disease_id.clone().unwrap()).collect();
        assert_eq!(cat_ids, vec!["both", "cat_only"]);

        assert!(clinical_details_for_species(&kb.clinical_details, None).is_empty());
    }

    #[test]
    fn test_other_species_get_no_breed_or_clinical_data() {
        let kb = sample_kb();
        let p = pet(json!({ "species": "rabbit", "breed": "lab" }));
        let payload = build_context(&kb, &p, &[], "en", "familiar");
        assert!(payload.breed_risks_for_pet.is_empty());
        assert!(payload.clinical_details_for_species.is_empty());
        assert_eq!(payload.pet.species_i18n_key.as_deref(), Some("animal_rabbit"));
    }

    #[test]
    fn test_species_i18n_keys() {
        assert_eq!(
            species_i18n_key(Some(&Species::Dog), Some(Sex::Male)).as_deref(),
            Some("animal_dog_male")
        );
        assert_eq!(
            species_i18n_key(Some(&Species::Cat), Some(Sex::Female)).as_deref(),
            Some("animal_cat_female")
        );
        assert_eq!(
            species_i18n_key(Some(&Species::Cat), None).as_deref(),
            Some("animal_cat")
        );
        assert_eq!(
            species_i18n_key(Some(&Species::Bird), Some(Sex::Male)).as_deref(),
            Some("animal_bird")
        );
        assert_eq!(species_i18n_key(None, Some(Sex::Male)), None);
    }

    #[test]
    fn test_sex_key() {
        assert_eq!(sex_key(Some(Sex::Male)), "male");
        assert_eq!(sex_key(Some(Sex::Female)), "female");
        assert_eq!(sex_key(None), "unknown");
    }

    #[test]
    fn test_resolve_lang_order() {
        let with_lang = pet(json!({ "lang": "ru" }));
        assert_eq!(resolve_lang(Some("es"), &with_lang, Some("de")), "es");
        assert_eq!(resolve_lang(Some("  "), &with_lang, Some("de")), "ru");
        assert_eq!(resolve_lang(None, &PetProfile::default(), Some("de")), "de");
        assert_eq!(resolve_lang(None, &PetProfile::default(), None), "en");
    }

    #[test]
    fn test_summary_text() {
        let kb = KnowledgeBase::default();
        let p = pet(json!({ "name": "Luna", "species": "dog", "sex": "female", "ageYears": 8, "neutered": true }));
        let payload = build_context(&kb, &p, &["vomiting".to_string()], "es", "familiar");
        assert!(payload.context.contains("Nombre: Luna"));
        assert!(payload.context.contains("SpeciesI18nKey: animal_dog_female"));
        assert!(payload.context.contains("Edad: 8 años"));
        assert!(payload.context.contains("Esterilizado: Sí"));
        assert!(payload.context.contains("Idioma del usuario: Español"));
        assert!(payload.context.contains("Síntomas reportados: vomiting."));
    }

    #[test]
    fn test_every_payload_field_present() {
        let kb = KnowledgeBase::default();
        let payload = build_context(&kb, &PetProfile::default(), &[], "en", "familiar");
        let value = serde_json::to_value(&payload).unwrap();
        for field in [
            "pet",
            "userLang",
            "symptomKeys",
            "nivelUsuario",
            "algorithms",
            "clinical_details_for_species",
            "breed_risks_for_pet",
            "knowledgeBase",
            "context",
        ] {
            assert!(value.get(field).is_some(), "missing field {}", field);
        }
        for field in [
            "id",
            "name",
            "species",
            "breed",
            "sex",
            "ageYears",
            "neutered",
            "speciesI18nKey",
            "sexKey",
        ] {
            assert!(value["pet"].get(field).is_some(), "missing pet field {}", field);
        }
        assert_eq!(value["pet"]["speciesI18nKey"], Value::Null);
        assert_eq!(value["pet"]["sexKey"], json!("unknown"));
    }

    #[test]
    fn test_age_serializes_as_integer_when_whole() {
        let kb = KnowledgeBase::default();
        let p = pet(json!({ "ageYears": 8 }));
        let value = serde_json::to_value(build_context(&kb, &p, &[], "en", "familiar")).unwrap();
        assert_eq!(value["pet"]["ageYears"], json!(8));

        let p = pet(json!({ "ageYears": 1.5 }));
        let value = serde_json::to_value(build_context(&kb, &p, &[], "en", "familiar")).unwrap();
        assert_eq!(value["pet"]["ageYears"], json!(1.5));
    }

    fn builder_with(json_kb: &str, config: ContextConfig) -> ContextBuilder {
        let cache = Arc::new(KnowledgeBaseCache::new(Arc::new(
            BundleKnowledgeSource::from_json_str("test", json_kb),
        )));
        ContextBuilder::new(cache, &config)
    }

    #[tokio::test]
    async fn test_builder_empty_input() {
        let builder = builder_with(
            r#"{ "algorithms": [{ "id": "x", "nombre": "X", "nivelUsuario": "professional" }] }"#,
            ContextConfig::default(),
        );
        let out = builder.build(&json!({}), &[], None, None).await;
        let value: Value = serde_json::from_str(&out).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["pet"]["speciesI18nKey"], Value::Null);
        assert_eq!(value["userLang"], json!("en"));
        assert_eq!(value["nivelUsuario"], json!("familiar"));
        assert_eq!(value["algorithms"], json!([]));
        assert_eq!(value["clinical_details_for_species"], json!([]));
        assert_eq!(value["breed_risks_for_pet"], json!([]));
        assert_eq!(builder.cache().load_count(), 1);
    }

    #[tokio::test]
    async fn test_builder_uses_config_defaults() {
        let builder = builder_with(
            r#"{ "algorithms": [{ "id": "x", "nombre": "X", "nivelUsuario": "professional" }] }"#,
            ContextConfig {
                default_lang: Some("es".to_string()),
                user_level: "professional".to_string(),
            },
        );
        let value = builder.build_json(&json!({ "species": "cat" }), &[], None, Some(" ")).await;
        assert_eq!(value["userLang"], json!("es"));
        assert_eq!(value["nivelUsuario"], json!("professional"));
        assert_eq!(value["algorithms"][0]["id"], json!("x"));
    }

    #[tokio::test]
    async fn test_builder_survives_broken_knowledge_base() {
        let builder = builder_with("{ not json", ContextConfig::default());
        let value = builder
            .build_json(&json!({ "species": "dog" }), &["tos".to_string()], Some("es"), None)
            .await;
        assert!(value.get("error").is_none());
        assert_eq!(value["symptomKeys"], json!(["tos"]));
        assert_eq!(value["algorithms"], json!([]));
    }
}
