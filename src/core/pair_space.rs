use crate::domain::model::IndustryCountryPair;
use crate::domain::ports::CoverageStore;
use crate::utils::error::StoreError;
use std::collections::HashSet;

/// 已知 industries × countries 的完整笛卡兒積
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairSpace {
    industries: Vec<String>,
    countries: Vec<String>,
}

impl PairSpace {
    /// 去除空白與重複名稱，保留第一次出現的順序
    pub fn new<I, C>(industries: I, countries: C) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            industries: dedup_names(industries),
            countries: dedup_names(countries),
        }
    }

    pub async fn from_store<S: CoverageStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        let industries = store.all_known_industries().await?;
        let countries = store.all_known_countries().await?;
        Ok(Self::new(industries, countries))
    }

    pub fn industries(&self) -> &[String] {
        &self.industries
    }

    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn len(&self) -> usize {
        self.industries.len() * self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, pair: &IndustryCountryPair) -> bool {
        self.industries.contains(&pair.industry) && self.countries.contains(&pair.country)
    }

    /// 以 industry 為主序列舉所有 pair
    pub fn pairs(&self) -> impl Iterator<Item = IndustryCountryPair> + '_ {
        self.industries.iter().flat_map(move |industry| {
            self.countries
                .iter()
                .map(move |country| IndustryCountryPair::new(industry.clone(), country.clone()))
        })
    }
}

fn dedup_names<T>(names: T) -> Vec<String>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty() && seen.insert(n.clone()))
        .collect()
}
