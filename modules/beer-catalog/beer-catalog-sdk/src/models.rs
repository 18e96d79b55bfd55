//! Wire models for the beer catalog API.
//!
//! Field names are camelCase on the wire. These types carry no behavior
//! beyond (de)serialization and filter construction.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BeerClientError;

/// Beer style. The wire form is the upper-case name (`PALE_ALE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeerStyle {
    Lager,
    Pilsner,
    Stout,
    Gose,
    Porter,
    Ale,
    Wheat,
    Ipa,
    PaleAle,
    Saison,
}

impl BeerStyle {
    pub const ALL: [BeerStyle; 10] = [
        Self::Lager,
        Self::Pilsner,
        Self::Stout,
        Self::Gose,
        Self::Porter,
        Self::Ale,
        Self::Wheat,
        Self::Ipa,
        Self::PaleAle,
        Self::Saison,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lager => "LAGER",
            Self::Pilsner => "PILSNER",
            Self::Stout => "STOUT",
            Self::Gose => "GOSE",
            Self::Porter => "PORTER",
            Self::Ale => "ALE",
            Self::Wheat => "WHEAT",
            Self::Ipa => "IPA",
            Self::PaleAle => "PALE_ALE",
            Self::Saison => "SAISON",
        }
    }
}

impl fmt::Display for BeerStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown beer style '{0}'")]
pub struct ParseBeerStyleError(pub String);

impl FromStr for BeerStyle {
    type Err = ParseBeerStyleError;

    /// Case-insensitive; `-` is accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| ParseBeerStyleError(s.to_owned()))
    }
}

/// A catalog entry.
///
/// `id`, `version` and the timestamps are assigned by the server; leave them
/// `None` when creating. Absent optional fields are omitted from request
/// bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Optimistic-concurrency counter, never changed client-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    pub beer_name: String,
    pub beer_style: BeerStyle,
    pub upc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_on_hand: Option<i32>,
    /// Sent as an exact JSON number; accepted as a number or a string.
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<NaiveDateTime>,
}

impl Beer {
    /// A beer ready to be created: no server-assigned fields.
    #[must_use]
    pub fn new(
        beer_name: impl Into<String>,
        beer_style: BeerStyle,
        upc: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id: None,
            version: None,
            beer_name: beer_name.into(),
            beer_style,
            upc: upc.into(),
            quantity_on_hand: None,
            price,
            created_date: None,
            update_date: None,
        }
    }

    #[must_use]
    pub fn with_quantity_on_hand(mut self, quantity: i32) -> Self {
        self.quantity_on_hand = Some(quantity);
        self
    }
}

/// One page of list results.
///
/// The counters are passed through as the server sent them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeerPage {
    /// Zero-based.
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    #[serde(rename = "content")]
    pub beers: Vec<Beer>,
}

/// Query for [`BeerClient::list_beers_with`](crate::BeerClient::list_beers_with).
///
/// Unset fields are left out of the request; the client adds no defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub beer_name: Option<String>,
    pub beer_style: Option<BeerStyle>,
    pub page_number: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListFilter {
    pub const BEER_NAME: &'static str = "beerName";
    pub const BEER_STYLE: &'static str = "beerStyle";
    pub const PAGE_NUMBER: &'static str = "pageNumber";
    pub const PAGE_SIZE: &'static str = "pageSize";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_beer_name(mut self, name: impl Into<String>) -> Self {
        self.beer_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_beer_style(mut self, style: BeerStyle) -> Self {
        self.beer_style = Some(style);
        self
    }

    #[must_use]
    pub const fn with_page_number(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beer_name.is_none()
            && self.beer_style.is_none()
            && self.page_number.is_none()
            && self.page_size.is_none()
    }

    /// Build a filter from loose key/value pairs such as parsed query input.
    ///
    /// Keys other than `beerName`, `beerStyle`, `pageNumber` and `pageSize`
    /// are ignored. A repeated key keeps its last value.
    ///
    /// # Errors
    ///
    /// Returns [`BeerClientError::Validation`] if a recognized key carries a
    /// value that does not parse (unknown style, non-numeric page).
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, BeerClientError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                Self::BEER_NAME => filter.beer_name = Some(value.to_owned()),
                Self::BEER_STYLE => {
                    let style = value.parse::<BeerStyle>().map_err(|e| {
                        BeerClientError::validation(e.to_string())
                    })?;
                    filter.beer_style = Some(style);
                }
                Self::PAGE_NUMBER => {
                    filter.page_number = Some(parse_page(Self::PAGE_NUMBER, value)?);
                }
                Self::PAGE_SIZE => filter.page_size = Some(parse_page(Self::PAGE_SIZE, value)?),
                _ => {}
            }
        }
        Ok(filter)
    }

    /// Query parameters in wire order: `beerName`, `beerStyle`, `pageNumber`,
    /// `pageSize`. Unset fields are skipped.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(4);
        if let Some(ref name) = self.beer_name {
            pairs.push((Self::BEER_NAME, name.clone()));
        }
        if let Some(style) = self.beer_style {
            pairs.push((Self::BEER_STYLE, style.as_str().to_owned()));
        }
        if let Some(n) = self.page_number {
            pairs.push((Self::PAGE_NUMBER, n.to_string()));
        }
        if let Some(n) = self.page_size {
            pairs.push((Self::PAGE_SIZE, n.to_string()));
        }
        pairs
    }
}

fn parse_page(key: &str, value: &str) -> Result<u32, BeerClientError> {
    value.trim().parse().map_err(|_| {
        BeerClientError::validation(format!(
            "{key} must be a non-negative integer, got '{value}'"
        ))
    })
}
