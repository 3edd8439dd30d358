use std::collections::HashMap;

use crate::models::Coordinates;

/// Place name -> coordinates, matched case-insensitively
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<String, Coordinates>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a [f64; 2])>,
    {
        let mut gazetteer = Self::new();
        for (name, [latitude, longitude]) in entries {
            gazetteer.insert(name, *latitude, *longitude);
        }
        gazetteer
    }

    pub fn insert(&mut self, name: &str, latitude: f64, longitude: f64) {
        self.places.insert(
            normalize_key(name),
            Coordinates {
                latitude,
                longitude,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<Coordinates> {
        self.places.get(&normalize_key(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

fn normalize_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
