//! Query parameters of `GET /influencers`, validated into a filter plus a page.
use crate::{
    error::AppError,
    models::{Gender, Influencer},
    utils::{first_value, split_csv},
};

pub const DEFAULT_LIMIT: u64 = 6;
pub const DEFAULT_PAGE: u64 = 1;

#[derive(Debug, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub label: Option<String>,
    pub gender: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

/// Conditions ANDed together. Empty means "everything".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFilter {
    pub search: Option<String>,
    pub labels: Vec<String>,
    pub gender: Option<Gender>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub skip: u64,
}

impl ListQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let get = |key| first_value(pairs, key).map(str::to_string);

        Self {
            search: get("search"),
            label: get("label"),
            gender: get("gender"),
            limit: get("limit"),
            page: get("page"),
        }
    }

    pub fn parse(&self) -> Result<(ListFilter, Pagination), AppError> {
        let limit = parse_positive("limit", self.limit.as_deref(), DEFAULT_LIMIT)?;
        let page = parse_positive("page", self.page.as_deref(), DEFAULT_PAGE)?;

        let filter = ListFilter {
            search: non_empty(self.search.as_deref()).map(str::to_string),
            labels: non_empty(self.label.as_deref())
                .map(|raw| split_csv(raw).map(str::to_string).collect())
                .unwrap_or_default(),
            gender: self.gender.as_deref().and_then(Gender::from_filter),
        };

        // The driver sends skip as a signed 64-bit integer.
        let skip = (page - 1)
            .checked_mul(limit)
            .filter(|skip| *skip <= i64::MAX as u64)
            .ok_or_else(|| AppError::InvalidQuery {
                param: "page",
                reason: "page offset out of range".to_string(),
            })?;

        let pagination = Pagination { limit, skip };

        Ok((filter, pagination))
    }
}

impl ListFilter {
    pub fn matches(&self, influencer: &Influencer) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = influencer
                .name
                .as_ref()
                .is_some_and(|name| name.to_lowercase().contains(&needle));

            if !hit {
                return false;
            }
        }

        if !self.labels.is_empty() {
            let hit = influencer
                .label
                .as_ref()
                .is_some_and(|set| self.labels.iter().any(|label| set.contains(label)));

            if !hit {
                return false;
            }
        }

        match self.gender {
            Some(gender) => influencer.gender == Some(gender),
            None => true,
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

fn parse_positive(param: &'static str, raw: Option<&str>, default: u64) -> Result<u64, AppError> {
    let Some(raw) = non_empty(raw) else {
        return Ok(default);
    };

    let value: i64 = raw.parse().map_err(|e| AppError::InvalidQuery {
        param,
        reason: format!("{e}"),
    })?;

    if value < 1 {
        return Err(AppError::InvalidQuery {
            param,
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use mongodb::bson::oid::ObjectId;

    use super::*;
    use crate::models::InfluencerPayload;

    fn query(pairs: &[(&str, &str)]) -> ListQuery {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "search" => query.search = value,
                "label" => query.label = value,
                "gender" => query.gender = value,
                "limit" => query.limit = value,
                "page" => query.page = value,
                _ => unreachable!(),
            }
        }
        query
    }

    fn influencer(name: &str, labels: &[&str], gender: Option<Gender>) -> Influencer {
        Influencer::new(
            ObjectId::new(),
            InfluencerPayload {
                name: Some(name.to_string()),
                label: Some(labels.iter().map(|l| l.to_string()).collect::<BTreeSet<_>>()),
                gender,
                ..Default::default()
            },
            0,
        )
    }

    #[test]
    fn test_defaults() {
        let (filter, pagination) = query(&[]).parse().unwrap();

        assert_eq!(filter, ListFilter::default());
        assert_eq!(pagination, Pagination { limit: 6, skip: 0 });
    }

    #[test]
    fn test_page_to_skip() {
        let (_, pagination) = query(&[("limit", "10"), ("page", "3")]).parse().unwrap();
        assert_eq!(pagination, Pagination { limit: 10, skip: 20 });
    }

    #[test]
    fn test_malformed_numbers() {
        for pairs in [
            [("limit", "ten")],
            [("page", "1.5")],
            [("limit", "0")],
            [("page", "-2")],
        ] {
            assert!(matches!(
                query(&pairs).parse(),
                Err(AppError::InvalidQuery { .. })
            ));
        }
    }

    #[test]
    fn test_offset_out_of_range() {
        let max = i64::MAX.to_string();

        let (_, pagination) = query(&[("limit", max.as_str()), ("page", "2")]).parse().unwrap();
        assert_eq!(pagination.skip, i64::MAX as u64);

        assert!(matches!(
            query(&[("limit", max.as_str()), ("page", "3")]).parse(),
            Err(AppError::InvalidQuery { param: "page", .. })
        ));
    }

    #[test]
    fn test_repeated_param_takes_first() {
        let pairs = vec![
            ("limit".to_string(), "2".to_string()),
            ("limit".to_string(), "3".to_string()),
        ];

        let (_, pagination) = ListQuery::from_pairs(&pairs).parse().unwrap();
        assert_eq!(pagination.limit, 2);
    }

    #[test]
    fn test_unknown_gender_ignored() {
        let (filter, _) = query(&[("gender", "x")]).parse().unwrap();
        assert_eq!(filter.gender, None);
    }

    #[test]
    fn test_labels_split() {
        let (filter, _) = query(&[("label", "tech,music")]).parse().unwrap();
        assert_eq!(filter.labels, vec!["tech", "music"]);
    }

    #[test]
    fn test_matches() {
        let ana = influencer("Ana Lopez", &["tech", "travel"], Some(Gender::Female));
        let bo = influencer("Bo", &["music"], Some(Gender::Male));

        let (filter, _) = query(&[("search", "LOP")]).parse().unwrap();
        assert!(filter.matches(&ana));
        assert!(!filter.matches(&bo));

        let (filter, _) = query(&[("label", "music,food")]).parse().unwrap();
        assert!(!filter.matches(&ana));
        assert!(filter.matches(&bo));

        let (filter, _) = query(&[("gender", "f"), ("label", "tech")]).parse().unwrap();
        assert!(filter.matches(&ana));
        assert!(!filter.matches(&bo));
    }

    #[test]
    fn test_search_is_literal() {
        let dotted = influencer("a.b", &[], None);
        let plain = influencer("axb", &[], None);

        let (filter, _) = query(&[("search", "a.b")]).parse().unwrap();
        assert!(filter.matches(&dotted));
        assert!(!filter.matches(&plain));
    }
}
