//! JSON input batches: one viewer, their listings and their places.

use camino::Utf8Path;
use homerank_core::{
    Apartment, Home, PointOfInterest, PreferenceSet, Scorable, Tier, UserId, Viewer,
};
use log::{debug, warn};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::CliError;

/// Which listing kind the batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ListingKind {
    Apartments,
    Homes,
}

/// Batch as written on disk. `items` is decoded once `kind` is known.
#[derive(Debug, Deserialize)]
struct RawBatch {
    kind: ListingKind,
    #[serde(default)]
    user: Option<UserId>,
    #[serde(default)]
    tier: Tier,
    items: serde_json::Value,
    #[serde(default)]
    places: Vec<PointOfInterest>,
    #[serde(default)]
    preferences: Option<PreferenceSet>,
}

/// A decoded batch of one listing kind.
#[derive(Debug, Clone)]
pub(crate) struct Batch<T> {
    pub(crate) viewer: Viewer,
    pub(crate) items: Vec<T>,
    pub(crate) places: Vec<PointOfInterest>,
    /// Preferences to store for the viewer before scoring.
    pub(crate) preferences: Option<PreferenceSet>,
}

/// A decoded batch of either kind.
#[derive(Debug, Clone)]
pub(crate) enum Listings {
    Apartments(Batch<Apartment>),
    Homes(Batch<Home>),
}

impl Listings {
    pub(crate) const fn kind(&self) -> ListingKind {
        match self {
            Self::Apartments(_) => ListingKind::Apartments,
            Self::Homes(_) => ListingKind::Homes,
        }
    }
}

/// Load and validate the batch at `path`.
pub(crate) fn load_batch(path: &Utf8Path) -> Result<Listings, CliError> {
    let contents = homerank_fs::read_to_string(path).map_err(|source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    parse_batch(path, &contents)
}

pub(crate) fn parse_batch(path: &Utf8Path, contents: &str) -> Result<Listings, CliError> {
    let parse_error = |source| CliError::ParseInput {
        path: path.to_path_buf(),
        source,
    };
    let raw: RawBatch = serde_json::from_str(contents).map_err(parse_error)?;
    let listings = match raw.kind {
        ListingKind::Apartments => Listings::Apartments(decode(raw).map_err(parse_error)?),
        ListingKind::Homes => Listings::Homes(decode(raw).map_err(parse_error)?),
    };
    match &listings {
        Listings::Apartments(batch) => batch.check_limits()?,
        Listings::Homes(batch) => batch.check_limits()?,
    }
    Ok(listings)
}

fn decode<T: DeserializeOwned>(raw: RawBatch) -> Result<Batch<T>, serde_json::Error> {
    let items: Vec<T> = serde_json::from_value(raw.items)?;
    let viewer = match raw.user {
        Some(user) => Viewer::Registered {
            user,
            tier: raw.tier,
        },
        None => Viewer::Anonymous,
    };
    let preferences = match (viewer, raw.preferences) {
        (Viewer::Anonymous, Some(_)) => {
            warn!("ignoring preferences supplied for an anonymous viewer");
            None
        }
        (_, preferences) => preferences,
    };
    debug!(
        "decoded batch of {} items and {} places",
        items.len(),
        raw.places.len()
    );
    Ok(Batch {
        viewer,
        items,
        places: raw.places,
        preferences,
    })
}

impl<T: Scorable> Batch<T> {
    /// Reject batches that exceed the viewer's tier limits.
    fn check_limits(&self) -> Result<(), CliError> {
        let Viewer::Registered { user, tier } = self.viewer else {
            return Ok(());
        };
        let places = self
            .places
            .iter()
            .filter(|place| place.owner == user)
            .count();
        if places > tier.place_limit() {
            return Err(CliError::TooManyPlaces {
                user,
                tier,
                count: places,
                limit: tier.place_limit(),
            });
        }
        let listings = self.items.iter().filter(|item| item.owner() == user).count();
        if listings > tier.listing_limit() {
            return Err(CliError::TooManyListings {
                user,
                tier,
                count: listings,
                limit: tier.listing_limit(),
            });
        }
        Ok(())
    }
}
