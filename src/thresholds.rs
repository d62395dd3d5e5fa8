//! Threshold resolution
//!
//! Finds the LFP alert bounds configured for a hemisphere in the clinician's
//! active group (`Groups.Final[*].ActiveGroup`).

use serde_json::Value;

use crate::navigator::{Document, Navigate};
use crate::path;
use crate::types::{Hemisphere, ThresholdPair};

/// Resolver for per-hemisphere alert thresholds
pub struct ThresholdResolver;

impl ThresholdResolver {
    /// Resolve thresholds for `hemisphere`.
    ///
    /// Active groups are searched in export order and the first sensing
    /// channel for the hemisphere wins. The device should never flag more
    /// than one group active; if it does, a later group is only consulted
    /// when the earlier ones have no channel for this hemisphere. Missing
    /// groups or channels yield an empty pair.
    pub fn resolve(document: &Document, hemisphere: Hemisphere) -> ThresholdPair {
        let channel = Self::active_groups(document)
            .flat_map(|group| {
                group
                    .array_at(&path!["ProgramSettings", "SensingChannel"])
                    .into_iter()
                    .flatten()
            })
            .find(|channel| {
                channel.str_at(&path!["HemisphereLocation"]) == Some(hemisphere.location_key())
            });

        match channel {
            Some(channel) => ThresholdPair {
                upper: channel.f64_at(&path!["UpperLfpThreshold"]),
                lower: channel.f64_at(&path!["LowerLfpThreshold"]),
            },
            None => {
                log::debug!("no active sensing channel; {} thresholds unset", hemisphere);
                ThresholdPair::default()
            }
        }
    }

    /// Resolve `(left, right)` thresholds
    pub fn resolve_both(document: &Document) -> (ThresholdPair, ThresholdPair) {
        (
            Self::resolve(document, Hemisphere::Left),
            Self::resolve(document, Hemisphere::Right),
        )
    }

    fn active_groups(document: &Document) -> impl Iterator<Item = &Value> {
        document
            .array_at(&path!["Groups", "Final"])
            .into_iter()
            .flatten()
            .filter(|group| group.bool_at(&path!["ActiveGroup"]) == Some(true))
    }
}
