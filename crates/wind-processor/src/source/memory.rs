use async_trait::async_trait;

use super::{FetchRequest, GridSource};
use crate::clip::crop_window;
use crate::error::Result;
use crate::types::FieldSet;

/// Source backed by field sets held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    days: Vec<FieldSet>,
}

impl InMemorySource {
    pub fn new(days: Vec<FieldSet>) -> Self {
        Self { days }
    }

    pub fn push(&mut self, day: FieldSet) {
        self.days.push(day);
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[async_trait]
impl GridSource for InMemorySource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<FieldSet>> {
        let mut days: Vec<&FieldSet> = self
            .days
            .iter()
            .filter(|day| request.window.contains(day.date()))
            .filter(|day| {
                day.geometry()
                    .map_or(false, |g| crop_window(g, &request.aoi).is_some())
            })
            .collect();
        days.sort_by_key(|day| day.date());

        days.into_iter()
            .map(|day| day.select(request.variables.as_slice()))
            .collect()
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessorError;
    use crate::testdata::uniform_wind_day;
    use crate::types::GridGeometry;
    use chrono::NaiveDate;
    use wind_common::{AreaOfInterest, BoundingBox, CrsCode, DateWindow};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn request(variables: &[&str]) -> FetchRequest {
        FetchRequest::new(
            variables.iter().map(|s| s.to_string()).collect(),
            AreaOfInterest::from_bbox("box", &BoundingBox::new(0.0, 0.0, 2.0, 2.0)).unwrap(),
            DateWindow::parse("2024-06-01", "2024-06-03").unwrap(),
        )
    }

    fn geometry() -> GridGeometry {
        GridGeometry::new(2, 2, BoundingBox::new(0.0, 0.0, 2.0, 2.0), CrsCode::Epsg4326)
    }

    #[tokio::test]
    async fn test_filters_window_and_orders_by_date() {
        let source = InMemorySource::new(vec![
            uniform_wind_day(date(3), geometry(), "u", "v", 1.0, 1.0).unwrap(),
            uniform_wind_day(date(2), geometry(), "u", "v", 1.0, 1.0).unwrap(),
            uniform_wind_day(date(1), geometry(), "u", "v", 1.0, 1.0).unwrap(),
        ]);

        let days = source.fetch(&request(&["u", "v"])).await.unwrap();
        let dates: Vec<_> = days.iter().map(|d| d.date()).collect();
        assert_eq!(dates, vec![date(1), date(2)]);
    }

    #[tokio::test]
    async fn test_skips_days_outside_aoi() {
        let far = GridGeometry::new(2, 2, BoundingBox::new(50.0, 50.0, 52.0, 52.0), CrsCode::Epsg4326);
        let source = InMemorySource::new(vec![uniform_wind_day(date(1), far, "u", "v", 1.0, 1.0).unwrap()]);
        assert!(source.fetch(&request(&["u", "v"])).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_variable() {
        let source = InMemorySource::new(vec![uniform_wind_day(date(1), geometry(), "u", "v", 1.0, 1.0).unwrap()]);
        let err = source.fetch(&request(&["u", "t2m"])).await.unwrap_err();
        assert!(matches!(err, ProcessorError::MissingVariable { .. }));
    }
}
