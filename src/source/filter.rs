//! Row selection before ingestion.

use std::collections::BTreeSet;

use crate::config::IngestConfig;
use crate::models::{split_alternate_names, GeoPoint, PlaceRecord};

use super::GeonamesRow;

/// Keeps populated places of interest that carry a coordinate and a population.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    /// `None` accepts every country
    countries: Option<BTreeSet<String>>,
    feature_codes: BTreeSet<String>,
}

/// Counts of why rows were dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub accepted: usize,
    pub wrong_country: usize,
    pub wrong_feature: usize,
    pub incomplete: usize,
}

impl RecordFilter {
    pub fn new(countries: Option<BTreeSet<String>>, feature_codes: BTreeSet<String>) -> Self {
        let countries = countries.map(|c| c.into_iter().map(|s| s.to_uppercase()).collect());
        Self {
            countries,
            feature_codes,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(Some(config.countries.clone()), config.feature_codes.clone())
    }

    /// Replace the country list
    pub fn with_countries(mut self, countries: Option<BTreeSet<String>>) -> Self {
        self.countries = countries.map(|c| c.into_iter().map(|s| s.to_uppercase()).collect());
        self
    }

    pub fn countries(&self) -> Option<&BTreeSet<String>> {
        self.countries.as_ref()
    }

    /// Convert a row into a record, or `None` if it does not qualify.
    pub fn apply(&self, row: GeonamesRow, stats: &mut FilterStats) -> Option<PlaceRecord> {
        if let Some(countries) = &self.countries {
            if !countries.contains(&row.country_code) {
                stats.wrong_country += 1;
                return None;
            }
        }
        if !self.feature_codes.contains(&row.feature_code) {
            stats.wrong_feature += 1;
            return None;
        }
        let (Some(lat), Some(lon), Some(population)) = (row.latitude, row.longitude, row.population)
        else {
            stats.incomplete += 1;
            return None;
        };

        stats.accepted += 1;
        Some(PlaceRecord {
            alternate_names: split_alternate_names(&row.alternatenames),
            name: row.name,
            ascii_name: row.asciiname,
            point: GeoPoint::new(lat, lon),
            feature_code: row.feature_code,
            population,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GeonamesReader;

    fn rows(data: &str) -> Vec<GeonamesRow> {
        GeonamesReader::new(data.as_bytes())
            .rows()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    const DATA: &str = "\
2988507\tParis\tParis\tLutece,Lutetia\t48.85341\t2.3488\tP\tPPLC\tFR\t\t11\t75\t751\t75056\t2138551\t\t42\tEurope/Paris\t2023-10-12
2950159\tBerlin\tBerlin\t\t52.52437\t13.41053\tP\tPPLC\tDE\t\t16\t00\t11000\t11000000\t3426354\t74\t43\tEurope/Berlin\t2022-06-21
6942553\tParis 01 Louvre\tParis 01 Louvre\t\t48.86\t2.34\tP\tPPLX\tFR\t\t11\t75\t751\t75101\t17443\t\t35\tEurope/Paris\t2019-09-05
3017382\tNowhere\tNowhere\t\t48.0\t2.0\tP\tPPL\tFR\t\t11\t\t\t\t\t\t10\tEurope/Paris\t2020-01-01
";

    #[test]
    fn test_filters_by_country_feature_and_completeness() {
        let filter = RecordFilter::new(
            Some(["fr".to_string()].into_iter().collect()),
            crate::config::IngestConfig::default().feature_codes,
        );
        let mut stats = FilterStats::default();
        let records: Vec<PlaceRecord> = rows(DATA)
            .into_iter()
            .filter_map(|r| filter.apply(r, &mut stats))
            .collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Paris");
        assert_eq!(records[0].alternate_names, vec!["Lutece", "Lutetia"]);
        assert_eq!(records[0].population, 2138551);
        assert_eq!(
            stats,
            FilterStats {
                accepted: 1,
                wrong_country: 1,
                wrong_feature: 1,
                incomplete: 1,
            }
        );
    }

    #[test]
    fn test_no_country_restriction() {
        let filter = RecordFilter::from_config(&IngestConfig::default()).with_countries(None);
        let mut stats = FilterStats::default();
        let count = rows(DATA)
            .into_iter()
            .filter_map(|r| filter.apply(r, &mut stats))
            .count();
        assert_eq!(count, 2);
    }
}
