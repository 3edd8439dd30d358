//! Canonical filter <-> flat query parameters
//!
//! Used for shareable search URLs. Multi-valued dimensions are comma-joined
//! (`\,` and `\\` escape literal commas and backslashes), amenities and
//! feature tags are `key=true` flags, and both price bounds are always present.
//!
//! Feature tag names become part of a parameter key:
//! - space -> `_`
//! - `-` -> `~h`
//! - `_` -> `~u`
//! - `~` -> `~~`

use std::collections::BTreeSet;
use tracing::debug;
use url::form_urlencoded;

use crate::models::{Amenity, CanonicalFilter, Category};
use crate::{Error, Result};

pub const LOCATION: &str = "location";
pub const CATEGORY: &str = "category";
pub const PRICE_MIN: &str = "price_min";
pub const PRICE_MAX: &str = "price_max";
pub const BEDROOMS: &str = "bedrooms";
pub const BATHROOMS: &str = "bathrooms";
pub const FEATURE_PREFIX: &str = "feature_";

const FLAG_ON: &str = "true";

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == ',' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn join_escaped<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(escape_value)
        .collect::<Vec<_>>()
        .join(",")
}

/// Split on unescaped commas, unescaping each part.
fn split_escaped(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => out.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    out.push(current);
    out.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

pub fn encode_tag_key(tag: &str) -> String {
    let mut out = String::with_capacity(tag.len() + 4);
    for c in tag.chars() {
        match c {
            ' ' => out.push('_'),
            '-' => out.push_str("~h"),
            '_' => out.push_str("~u"),
            '~' => out.push_str("~~"),
            _ => out.push(c),
        }
    }
    out
}

pub fn decode_tag_key(key: &str) -> Result<String> {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        match c {
            '_' => out.push(' '),
            '~' => match chars.next() {
                Some('h') => out.push('-'),
                Some('u') => out.push('_'),
                Some('~') => out.push('~'),
                other => {
                    return Err(Error::invalid_parameter(
                        format!("{}{}", FEATURE_PREFIX, key),
                        format!("bad escape `~{}`", other.map(String::from).unwrap_or_default()),
                    ))
                }
            },
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Flat parameter list, in a stable order.
pub fn encode(filter: &CanonicalFilter) -> Vec<(String, String)> {
    let mut params = Vec::new();

    if !filter.locations.is_empty() {
        params.push((
            LOCATION.to_string(),
            join_escaped(filter.locations.iter().map(String::as_str)),
        ));
    }
    if !filter.categories.is_empty() {
        params.push((
            CATEGORY.to_string(),
            join_escaped(filter.categories.iter().map(|c| c.slug())),
        ));
    }
    params.push((PRICE_MIN.to_string(), filter.price_min.to_string()));
    params.push((PRICE_MAX.to_string(), filter.price_max.to_string()));

    for (name, set) in [
        (BEDROOMS, &filter.bedrooms_at_least),
        (BATHROOMS, &filter.bathrooms_at_least),
    ] {
        if !set.is_empty() {
            let joined = set.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
            params.push((name.to_string(), joined));
        }
    }

    for amenity in &filter.amenities {
        params.push((amenity.slug().to_string(), FLAG_ON.to_string()));
    }
    for tag in &filter.feature_tags {
        params.push((
            format!("{}{}", FEATURE_PREFIX, encode_tag_key(tag)),
            FLAG_ON.to_string(),
        ));
    }
    params
}

fn parse_int<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_parameter(name, format!("`{}` is not a whole number", raw)))
}

fn parse_thresholds(name: &str, raw: &str) -> Result<BTreeSet<u32>> {
    split_escaped(raw)
        .iter()
        .map(|v| parse_int(name, v))
        .collect()
}

/// Rebuild a filter from parameters.
///
/// Unknown keys and unknown category slugs are ignored; malformed numbers are errors.
pub fn decode<K, V>(params: &[(K, V)]) -> Result<CanonicalFilter>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut filter = CanonicalFilter::default();

    for (key, value) in params {
        let (key, value) = (key.as_ref(), value.as_ref());
        match key {
            LOCATION => filter.locations.extend(split_escaped(value)),
            CATEGORY => {
                for slug in split_escaped(value) {
                    match Category::from_slug(&slug) {
                        Some(category) => {
                            filter.categories.insert(category);
                        }
                        None => debug!("Ignoring unknown category `{}`", slug),
                    }
                }
            }
            PRICE_MIN => filter.price_min = parse_int(key, value)?,
            PRICE_MAX => filter.price_max = parse_int(key, value)?,
            BEDROOMS => filter.bedrooms_at_least = parse_thresholds(key, value)?,
            BATHROOMS => filter.bathrooms_at_least = parse_thresholds(key, value)?,
            _ => {
                if value != FLAG_ON {
                    continue;
                }
                if let Some(encoded) = key.strip_prefix(FEATURE_PREFIX) {
                    filter.feature_tags.insert(decode_tag_key(encoded)?);
                } else if let Some(amenity) = Amenity::from_slug(key) {
                    filter.amenities.insert(amenity);
                } else {
                    debug!("Ignoring unknown search parameter `{}`", key);
                }
            }
        }
    }
    Ok(filter)
}

pub fn to_query_string(filter: &CanonicalFilter) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(encode(filter))
        .finish()
}

pub fn from_query_string(query: &str) -> Result<CanonicalFilter> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    decode(&pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PRICE_MAX_OPEN;

    fn rich_filter() -> CanonicalFilter {
        CanonicalFilter::new()
            .with_location("Marbella")
            .with_location("Puerto Banús, Marina")
            .with_location(r"Odd\Name")
            .with_category(Category::House)
            .with_category(Category::NewDevelopment)
            .with_price_range(200_000, 950_000)
            .with_bedrooms_at_least(2)
            .with_bedrooms_at_least(4)
            .with_bathrooms_at_least(1)
            .with_amenity(Amenity::Pool)
            .with_amenity(Amenity::AirConditioning)
            .with_feature_tag("Views - Sea")
            .with_feature_tag("Setting - Close-to-Golf")
            .with_feature_tag("snake_case ~ tilde")
    }

    #[test]
    fn test_round_trip_params() {
        let filter = rich_filter();
        assert_eq!(decode(&encode(&filter)).unwrap(), filter);
    }

    #[test]
    fn test_round_trip_query_string() {
        let filter = rich_filter();
        let query = to_query_string(&filter);
        assert_eq!(from_query_string(&query).unwrap(), filter);
        assert_eq!(from_query_string(&format!("?{}", query)).unwrap(), filter);
    }

    #[test]
    fn test_empty_filter_keeps_price_bounds() {
        let params = encode(&CanonicalFilter::new());
        assert_eq!(
            params,
            vec![
                (PRICE_MIN.to_string(), "0".to_string()),
                (PRICE_MAX.to_string(), PRICE_MAX_OPEN.to_string()),
            ]
        );
        assert_eq!(decode(&params).unwrap(), CanonicalFilter::new());
    }

    #[test]
    fn test_tag_key_encoding() {
        assert_eq!(encode_tag_key("Views - Sea"), "Views_~h_Sea");
        assert_eq!(decode_tag_key("Views_~h_Sea").unwrap(), "Views - Sea");
        assert_eq!(decode_tag_key("a~ub~~c").unwrap(), "a_b~c");
        assert!(decode_tag_key("bad~x").is_err());
        assert!(decode_tag_key("trailing~").is_err());
    }

    #[test]
    fn test_lenient_on_unknown_values() {
        let filter = decode(&[
            ("category", "house,castle"),
            ("pool", "true"),
            ("garage", "false"),
            ("utm_source", "newsletter"),
        ])
        .unwrap();
        assert_eq!(filter.categories.len(), 1);
        assert!(filter.amenities.contains(&Amenity::Pool));
        assert!(!filter.amenities.contains(&Amenity::Garage));
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        assert!(decode(&[("price_min", "cheap")]).is_err());
        assert!(decode(&[("bedrooms", "2,three")]).is_err());
    }

    #[test]
    fn test_escaped_split() {
        assert_eq!(
            split_escaped(r"a\,b,c\\,,d"),
            vec!["a,b".to_string(), r"c\".to_string(), "d".to_string()]
        );
    }
}
