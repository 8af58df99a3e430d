use sqlx::{Postgres, QueryBuilder};

use crate::models::CatalogQuery;
use crate::utils::pagination::PageRequest;

/// Catalog tables exposed through list routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogEntity {
    Sports,
    Tournaments,
    Venues,
    Teams,
    Countries,
    Cities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    SportType,
    Region,
    Country,
    Popular,
    Ids,
}

impl CatalogEntity {
    pub fn plural(&self) -> &'static str {
        match self {
            CatalogEntity::Sports => "sports",
            CatalogEntity::Tournaments => "tournaments",
            CatalogEntity::Venues => "venues",
            CatalogEntity::Teams => "teams",
            CatalogEntity::Countries => "countries",
            CatalogEntity::Cities => "cities",
        }
    }

    fn table(&self) -> &'static str {
        self.plural()
    }

    fn id_column(&self) -> &'static str {
        match self {
            CatalogEntity::Sports => "sport_id",
            CatalogEntity::Tournaments => "tournament_id",
            CatalogEntity::Venues => "venue_id",
            CatalogEntity::Teams => "team_id",
            CatalogEntity::Countries => "country_code",
            CatalogEntity::Cities => "city_id",
        }
    }

    fn columns(&self) -> &'static str {
        match self {
            CatalogEntity::Sports => "sport_id, name, slug",
            CatalogEntity::Tournaments => {
                "tournament_id, name, sport_type, season, region, country, date_start, \
                 date_stop, is_popular, slug, updated_at"
            }
            CatalogEntity::Venues => {
                "venue_id, name, official_name, city, country, capacity, latitude, longitude, \
                 slug, updated_at"
            }
            CatalogEntity::Teams => {
                "team_id, name, official_name, sport_type, country, is_popular, logo_url, slug, \
                 updated_at"
            }
            CatalogEntity::Countries => "country_code, name, region",
            CatalogEntity::Cities => "city_id, name, country",
        }
    }

    fn order_by(&self) -> &'static str {
        match self {
            CatalogEntity::Sports => "sport_id ASC",
            CatalogEntity::Tournaments => "date_start DESC NULLS LAST, name ASC",
            CatalogEntity::Venues | CatalogEntity::Teams => "name ASC NULLS LAST",
            CatalogEntity::Countries | CatalogEntity::Cities => "name ASC",
        }
    }

    fn filters(&self) -> &'static [Filter] {
        match self {
            CatalogEntity::Sports => &[Filter::Ids],
            CatalogEntity::Tournaments => &[
                Filter::SportType,
                Filter::Region,
                Filter::Country,
                Filter::Popular,
                Filter::Ids,
            ],
            CatalogEntity::Venues | CatalogEntity::Cities => &[Filter::Country, Filter::Ids],
            CatalogEntity::Teams => &[
                Filter::SportType,
                Filter::Country,
                Filter::Popular,
                Filter::Ids,
            ],
            CatalogEntity::Countries => &[Filter::Region, Filter::Ids],
        }
    }

    fn supports(&self, filter: Filter) -> bool {
        self.filters().contains(&filter)
    }
}

/// Appends the WHERE clause for `query`. Both the page query and the count
/// query go through here, so their predicates are identical.
fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, entity: CatalogEntity, query: &CatalogQuery) {
    let mut first = true;
    let mut and = |qb: &mut QueryBuilder<'static, Postgres>| {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    if entity.supports(Filter::SportType) {
        if let Some(sport_type) = non_empty(&query.sport_type) {
            and(qb);
            qb.push("sport_type = ").push_bind(sport_type);
        }
    }
    if entity.supports(Filter::Region) {
        if let Some(region) = non_empty(&query.region) {
            and(qb);
            qb.push("region = ").push_bind(region);
        }
    }
    if entity.supports(Filter::Country) {
        if let Some(country) = non_empty(&query.country) {
            and(qb);
            qb.push("country = ").push_bind(country);
        }
    }
    if entity.supports(Filter::Popular) {
        if let Some(popular) = query.is_popular {
            and(qb);
            qb.push("is_popular = ").push_bind(popular);
        }
    }
    if entity.supports(Filter::Ids) {
        if let Some(ids) = query.id_list() {
            and(qb);
            qb.push(entity.id_column())
                .push(" = ANY(")
                .push_bind(ids)
                .push(")");
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn count_query(entity: CatalogEntity, query: &CatalogQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", entity.table()));
    push_predicate(&mut qb, entity, query);
    qb
}

pub fn page_query(
    entity: CatalogEntity,
    query: &CatalogQuery,
    page: PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        entity.columns(),
        entity.table()
    ));
    push_predicate(&mut qb, entity, query);
    qb.push(" ORDER BY ")
        .push(entity.order_by())
        .push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}
