//! Search, sort and paginate over an in-memory collection.
//!
//! Every admin list (brands, clients, services, achievements, contact
//! messages) goes through [`list_page`]: filter by a case-insensitive
//! substring, stable sort, then cut one page. All functions here are pure.

use std::cmp::Ordering;

use models::{Achievement, Brand, Client, ContactMessage, Service};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::pagination::{PageRequest, DEFAULT_PAGE_SIZE};
use crate::upstream::Resource;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Id,
    Name,
    #[serde(alias = "createdAt")]
    CreatedAt,
}

/// One page of a filtered, sorted collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
    pub total_pages: usize,
    /// Effective page after clamping into `1..=total_pages`.
    pub page: usize,
    pub page_size: usize,
    pub start_index: usize,
    pub end_index: usize,
}

impl<T> Page<T> {
    pub fn empty(request: PageRequest) -> Self {
        paginate(Vec::new(), request)
    }

    pub fn has_previous(&self) -> bool { self.page > 1 }

    pub fn has_next(&self) -> bool { self.page < self.total_pages }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            page: self.page,
            page_size: self.page_size,
            start_index: self.start_index,
            end_index: self.end_index,
        }
    }
}

/// Keep items whose searchable text contains `query`, ignoring case.
/// An empty query keeps everything, in order.
pub fn filter_by_query<T, F>(items: Vec<T>, query: &str, key_of: F) -> Vec<T>
where
    F: Fn(&T) -> String,
{
    if query.is_empty() {
        return items;
    }
    let needle = query.to_lowercase();
    items
        .into_iter()
        .filter(|item| key_of(item).to_lowercase().contains(&needle))
        .collect()
}

/// Stable sort; `Desc` flips the comparator so ties keep input order.
pub fn sort_stable<T, C>(items: &mut [T], direction: SortDirection, compare: C)
where
    C: Fn(&T, &T) -> Ordering,
{
    items.sort_by(|a, b| direction.apply(compare(a, b)));
}

pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let request = request.normalize();
    let total_items = items.len();
    let total_pages = request.total_pages(total_items);
    let page = request.effective_page(total_items);
    let start_index = ((page - 1) * request.page_size).min(total_items);
    let end_index = (start_index + request.page_size).min(total_items);

    let items = items
        .into_iter()
        .skip(start_index)
        .take(end_index - start_index)
        .collect();

    Page {
        items,
        total_items,
        total_pages,
        page,
        page_size: request.page_size,
        start_index,
        end_index,
    }
}

/// Filter, sort and paginate in one pass.
pub fn list_page<T, K, C>(
    items: Vec<T>,
    query: &str,
    key_of: K,
    compare: C,
    direction: SortDirection,
    request: PageRequest,
) -> Page<T>
where
    K: Fn(&T) -> String,
    C: Fn(&T, &T) -> Ordering,
{
    let mut filtered = filter_by_query(items, query, key_of);
    sort_stable(&mut filtered, direction, compare);
    paginate(filtered, request)
}

/// Top-level entities that have an admin list.
pub trait Listable: Serialize + DeserializeOwned + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn search_text(&self) -> String;
    fn compare_by(&self, other: &Self, key: SortKey) -> Ordering;

    /// Raw image reference, resolved into a displayable source by callers.
    fn image_ref(&self) -> Option<&str> { None }
}

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl Listable for Brand {
    const RESOURCE: Resource = Resource::Brands;

    fn search_text(&self) -> String { self.name.clone() }

    fn compare_by(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Name => by_name(&self.name, &other.name),
            SortKey::Id | SortKey::CreatedAt => self.id.cmp(&other.id),
        }
    }

    fn image_ref(&self) -> Option<&str> { self.logo_url.as_deref() }
}

impl Listable for Client {
    const RESOURCE: Resource = Resource::Clients;

    fn search_text(&self) -> String { self.name.clone() }

    fn compare_by(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Name => by_name(&self.name, &other.name),
            SortKey::Id | SortKey::CreatedAt => self.id.cmp(&other.id),
        }
    }

    fn image_ref(&self) -> Option<&str> { self.image_url.as_deref() }
}

impl Listable for Service {
    const RESOURCE: Resource = Resource::Services;

    fn search_text(&self) -> String {
        format!("{} {}", self.name, self.short_desc)
    }

    fn compare_by(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Name => by_name(&self.name, &other.name),
            SortKey::Id | SortKey::CreatedAt => self.id.cmp(&other.id),
        }
    }

    fn image_ref(&self) -> Option<&str> { Some(self.image_url.as_str()) }
}

impl Listable for Achievement {
    const RESOURCE: Resource = Resource::Achievements;

    fn search_text(&self) -> String { self.title.clone() }

    fn compare_by(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Name => by_name(&self.title, &other.title),
            SortKey::Id | SortKey::CreatedAt => self.id.cmp(&other.id),
        }
    }

    fn image_ref(&self) -> Option<&str> { Some(self.image_url.as_str()) }
}

impl Listable for ContactMessage {
    const RESOURCE: Resource = Resource::ContactMessages;

    fn search_text(&self) -> String {
        let mut text = format!("{} {}", self.full_name, self.email);
        if let Some(company) = &self.company_name {
            text.push(' ');
            text.push_str(company);
        }
        text
    }

    fn compare_by(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Name => by_name(&self.full_name, &other.full_name),
            SortKey::CreatedAt => self.created_at.cmp(&other.created_at),
            SortKey::Id => self.id.cmp(&other.id),
        }
    }
}

/// Query-string parameters accepted by list endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default, alias = "dir")]
    pub order: Option<SortDirection>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default, alias = "pageSize")]
    pub page_size: Option<usize>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), self.page_size.unwrap_or(DEFAULT_PAGE_SIZE))
    }

    pub fn apply<T: Listable>(&self, items: Vec<T>) -> Page<T> {
        let key = self.sort.unwrap_or_default();
        list_page(
            items,
            self.q.as_deref().unwrap_or(""),
            T::search_text,
            |a, b| a.compare_by(b, key),
            self.order.unwrap_or_default(),
            self.page_request(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brands(names: &[&str]) -> Vec<Brand> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Brand { id: i as i64 + 1, name: n.to_string(), logo_url: None })
            .collect()
    }

    #[test]
    fn seven_items_three_per_page() {
        let items: Vec<u32> = (0..7).collect();
        let first = paginate(items.clone(), PageRequest::new(1, 3));
        assert_eq!(first.items, vec![0, 1, 2]);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.start_index, 0);

        let last = paginate(items, PageRequest::new(3, 3));
        assert_eq!(last.items, vec![6]);
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.start_index, 6);
        assert_eq!(last.end_index, 7);
        assert!(!last.has_next());
    }

    #[test]
    fn empty_collection_has_one_page() {
        let page = paginate(Vec::<u32>::new(), PageRequest::new(1, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!((page.start_index, page.end_index), (0, 0));
    }

    #[test]
    fn page_past_the_end_is_clamped() {
        let page = paginate((0..7).collect::<Vec<u32>>(), PageRequest::new(9, 3));
        assert_eq!(page.page, 3);
        assert_eq!(page.items, vec![6]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let items = brands(&["Schneider", "ABB", "schneider electric"]);
        let kept = filter_by_query(items, "SCHNEIDER", |b| b.name.clone());
        let names: Vec<_> = kept.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Schneider", "schneider electric"]);
    }

    #[test]
    fn descending_keeps_ties_in_input_order() {
        let mut items = vec![(1, "a"), (2, "b"), (1, "c"), (2, "d")];
        sort_stable(&mut items, SortDirection::Desc, |x, y| x.0.cmp(&y.0));
        assert_eq!(items, vec![(2, "b"), (2, "d"), (1, "a"), (1, "c")]);
    }

    #[test]
    fn list_params_drive_the_whole_pipeline() {
        let params: ListParams = serde_json::from_value(serde_json::json!({
            "q": "e",
            "sort": "name",
            "order": "desc",
            "page": 1,
            "page_size": 2
        }))
        .unwrap();
        let page = params.apply(brands(&["Siemens", "ABB", "Legrand", "Omron", "Eaton"]));
        let names: Vec<_> = page.items.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(names, vec!["Siemens", "Legrand"]);
    }

    #[test]
    fn contact_messages_search_email_and_company() {
        let msg = ContactMessage {
            id: 1,
            full_name: "Rina".into(),
            email: "rina@pln.co.id".into(),
            phone_number: None,
            company_name: Some("PLN".into()),
            interested_in: None,
            message: None,
            created_at: None,
        };
        assert!(msg.search_text().contains("pln.co.id"));
        assert!(msg.search_text().ends_with("PLN"));
    }
}
