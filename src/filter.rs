//! Facet filtering shared by every dashboard panel.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::error::{DashboardError, Result};
use crate::models::{DeliveryRecord, DeliveryTable, Facet};

/// Request-scoped facet selection.
///
/// An empty area or traffic set selects nothing; there is no implicit
/// "empty means all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub areas: HashSet<String>,
    pub traffic_levels: HashSet<String>,
    pub month: Option<String>,
}

impl FilterSelection {
    pub fn new<A, T, S>(areas: A, traffic_levels: T, month: Option<String>) -> Self
    where
        A: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            areas: areas.into_iter().map(Into::into).collect(),
            traffic_levels: traffic_levels.into_iter().map(Into::into).collect(),
            month,
        }
    }

    /// Every area and traffic level preselected, no month constraint.
    pub fn all(table: &DeliveryTable) -> Self {
        Self {
            areas: table.facet_values(Facet::Area).into_iter().collect(),
            traffic_levels: table.facet_values(Facet::Traffic).into_iter().collect(),
            month: None,
        }
    }

    /// Build a selection from comma-separated widget parameters.
    ///
    /// An absent list selects every value in the table; a present but empty
    /// list selects none.
    pub fn from_params(
        table: &DeliveryTable,
        areas: Option<&str>,
        traffic: Option<&str>,
        month: Option<&str>,
    ) -> Result<Self> {
        let list = |param: Option<&str>, facet: Facet| match param {
            Some(raw) => split_list(raw),
            None => table.facet_values(facet).into_iter().collect(),
        };
        let month = match month.map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(parse_month_label(label)?),
        };

        Ok(Self {
            areas: list(areas, Facet::Area),
            traffic_levels: list(traffic, Facet::Traffic),
            month,
        })
    }

    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        if !self.areas.contains(&record.area) || !self.traffic_levels.contains(&record.traffic) {
            return false;
        }
        match &self.month {
            None => true,
            Some(month) => record.order_month().as_deref() == Some(month.as_str()),
        }
    }
}

/// Rows of `records` matching `selection`, in input order.
pub fn filter<'a>(records: &'a [DeliveryRecord], selection: &FilterSelection) -> Vec<&'a DeliveryRecord> {
    records.iter().filter(|r| selection.matches(r)).collect()
}

fn split_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate an externally supplied `YYYY-MM` month label.
pub fn parse_month_label(label: &str) -> Result<String> {
    let label = label.trim();
    let well_formed = label.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", label), "%Y-%m-%d").is_ok();
    if well_formed {
        Ok(label.to_string())
    } else {
        Err(DashboardError::InvalidParameter(format!(
            "month must be YYYY-MM, got '{}'",
            label
        )))
    }
}
