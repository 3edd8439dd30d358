//! Raw source rows -> canonical `Listing`
//!
//! Pure and total: absent or malformed optional fields fall back to defaults,
//! nothing here returns an error.

use super::gazetteer::Gazetteer;
use crate::config::SearchConfig;
use crate::models::{AreaBreakdown, Coordinates, Listing};
use crate::sources::{RawRecord, SizeEncoding, SourceDescriptor, SourceKind};

#[derive(Debug, Clone)]
pub struct Normalizer {
    gazetteer: Gazetteer,
    title_word_count: usize,
    geocode_suffix: String,
}

impl Normalizer {
    pub fn new(gazetteer: Gazetteer, title_word_count: usize, geocode_suffix: impl Into<String>) -> Self {
        Self {
            gazetteer,
            title_word_count: title_word_count.max(1),
            geocode_suffix: geocode_suffix.into(),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            Gazetteer::from_entries(&config.gazetteer),
            config.title_word_count,
            config.geocode_suffix.clone(),
        )
    }

    /// Identity of a row, if it has one.
    pub fn identity(record: &RawRecord, source: &SourceDescriptor) -> Option<String> {
        record.text(&source.identity_field)
    }

    pub fn normalize(&self, record: &RawRecord, source: &SourceDescriptor) -> Listing {
        let fields = &source.fields;
        let town = record.text(&fields.location);
        let area = fields
            .location_secondary
            .as_deref()
            .and_then(|f| record.text(f));
        let description = record.text(&fields.description).unwrap_or_default();

        let property_type = {
            let labels = record.texts(&fields.category);
            (!labels.is_empty()).then(|| labels.join(", "))
        };

        Listing {
            id: Self::identity(record, source).unwrap_or_default(),
            source_id: source.name.clone(),
            domain: source.domain,
            title: self.title(record, source, area.as_deref(), &description),
            price: record.integer(&fields.price),
            size: size(record, &fields.size),
            listed_at: record.timestamp(&fields.updated),
            coordinates: self.coordinates(record, source, area.as_deref(), town.as_deref()),
            town,
            area,
            property_type,
            bedrooms: count(record, &fields.bedrooms),
            bathrooms: count(record, &fields.bathrooms),
            description,
            features: record.string_list(&fields.tags),
            images: record.string_list(&fields.images),
        }
    }

    /// Name, then area, then the opening words of the description, then a generic label.
    fn title(
        &self,
        record: &RawRecord,
        source: &SourceDescriptor,
        area: Option<&str>,
        description: &str,
    ) -> String {
        if let Some(name) = source.fields.title.as_deref().and_then(|f| record.text(f)) {
            return name;
        }
        if let Some(area) = area {
            return area.to_string();
        }
        let words: Vec<&str> = description
            .split_whitespace()
            .take(self.title_word_count)
            .collect();
        if !words.is_empty() {
            return words.join(" ");
        }
        match source.kind {
            SourceKind::Resale => "Property for sale",
            SourceKind::NewDevelopment => "New development",
            SourceKind::Rental => "Property for rent",
        }
        .to_string()
    }

    /// Native coordinates, then area, town and "town + suffix" lookups.
    fn coordinates(
        &self,
        record: &RawRecord,
        source: &SourceDescriptor,
        area: Option<&str>,
        town: Option<&str>,
    ) -> Option<Coordinates> {
        let fields = &source.fields;
        let native = match (fields.latitude.as_deref(), fields.longitude.as_deref()) {
            (Some(lat), Some(lng)) => record.number(lat).zip(record.number(lng)),
            _ => None,
        };
        if let Some((latitude, longitude)) = native {
            if latitude.is_finite() && longitude.is_finite() {
                return Some(Coordinates {
                    latitude,
                    longitude,
                });
            }
        }

        area.and_then(|a| self.gazetteer.lookup(a))
            .or_else(|| town.and_then(|t| self.gazetteer.lookup(t)))
            .or_else(|| {
                town.and_then(|t| {
                    self.gazetteer
                        .lookup(&format!("{} {}", t, self.geocode_suffix))
                })
            })
    }
}

fn size(record: &RawRecord, encoding: &SizeEncoding) -> AreaBreakdown {
    match encoding {
        SizeEncoding::Single(field) => AreaBreakdown {
            built: record.number(field),
            ..AreaBreakdown::default()
        },
        SizeEncoding::Structured {
            built,
            plot,
            terrace,
        } => AreaBreakdown {
            built: record.number(built),
            plot: record.number(plot),
            terrace: record.number(terrace),
        },
    }
}

fn count(record: &RawRecord, field: &str) -> Option<u32> {
    record.integer(field).and_then(|n| u32::try_from(n).ok())
}
