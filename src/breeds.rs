//! Breed alias resolution.
//!
//! The pet card takes free-text breed names while the breed predisposition
//! table uses one canonical spelling per breed. A breed entered on the card
//! is expanded into a set of normalized candidates: the entered text itself
//! plus any aliases listed for that exact text. Only dogs and cats have alias
//! tables.

use crate::models::SpeciesCode;

/// Entered breed text (matched exactly) → canonical breed names.
static DOG_BREED_ALIASES: &[(&str, &[&str])] = &[
    ("lab", &["Labrador Retriever"]),
    ("Lab", &["Labrador Retriever"]),
    ("Labrador", &["Labrador Retriever"]),
    ("labrador", &["Labrador Retriever"]),
    ("Golden", &["Golden Retriever"]),
    ("golden", &["Golden Retriever"]),
    ("German Shepherd", &["Pastor Alemán", "Pastor Aleman"]),
    ("Pastor Alemán", &["Pastor Alemán", "German Shepherd"]),
    ("Yorkie", &["Yorkshire Terrier"]),
    ("yorkie", &["Yorkshire Terrier"]),
    ("Frenchie", &["Bulldog Francés", "French Bulldog"]),
    ("French Bulldog", &["Bulldog Francés"]),
    ("English Bulldog", &["Bulldog Inglés"]),
    ("Teckel", &["Dachshund"]),
    ("Salchicha", &["Dachshund"]),
    ("Dachshund", &["Dachshund", "Teckel"]),
    ("Husky", &["Husky Siberiano", "Siberian Husky"]),
    ("Schnauzer", &["Schnauzer miniatura", "Schnauzer Miniatura"]),
    ("Mini Schnauzer", &["Schnauzer miniatura"]),
    ("Boxer", &["Boxer"]),
    ("Cavalier", &["Cavalier King Charles Spaniel"]),
    ("Cocker", &["Cocker Spaniel Inglés", "Cocker Spaniel"]),
    ("Poodle", &["Caniche"]),
    ("Caniche", &["Caniche", "Poodle"]),
    ("Great Dane", &["Gran Danés"]),
    ("Westie", &["West Highland White Terrier"]),
    ("Pug", &["Carlino", "Pug"]),
    ("Carlino", &["Carlino", "Pug"]),
];

static CAT_BREED_ALIASES: &[(&str, &[&str])] = &[
    ("Persian", &["Persa"]),
    ("persian", &["Persa"]),
    ("Siamese", &["Siamés"]),
    ("Siames", &["Siamés"]),
    ("Maine Coon", &["Maine Coon"]),
    ("British Shorthair", &["Británico de pelo corto", "British Shorthair"]),
    ("British", &["Británico de pelo corto", "British Shorthair"]),
    ("Sphynx", &["Sphynx", "Esfinge"]),
    ("Esfinge", &["Sphynx"]),
    ("Ragdoll", &["Ragdoll"]),
    ("Scottish Fold", &["Scottish Fold", "Fold Escocés"]),
    ("Abyssinian", &["Abisinio"]),
    ("Bengal", &["Bengalí", "Bengal"]),
    ("Burmese", &["Burmés", "Birmano"]),
];

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize_breed(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn alias_table(species: SpeciesCode) -> &'static [(&'static str, &'static [&'static str])] {
    match species {
        SpeciesCode::Dog => DOG_BREED_ALIASES,
        SpeciesCode::Cat => CAT_BREED_ALIASES,
    }
}

/// Normalized breed names that should match `breed` for `species`.
///
/// Blank input yields no candidates. Duplicates are removed, first
/// occurrence wins.
pub fn breed_candidates(breed: &str, species: Option<SpeciesCode>) -> Vec<String> {
    let aliases: &[&str] = species
        .and_then(|code| {
            alias_table(code)
                .iter()
                .find(|(key, _)| *key == breed)
                .map(|(_, names)| *names)
        })
        .unwrap_or(&[]);

    let mut candidates: Vec<String> = Vec::with_capacity(aliases.len() + 1);
    for name in std::iter::once(breed).chain(aliases.iter().copied()) {
        let normalized = normalize_breed(name);
        if !normalized.is_empty() && !candidates.contains(&normalized) {
            candidates.push(normalized);
        }
    }
    candidates
}
