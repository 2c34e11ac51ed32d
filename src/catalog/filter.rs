//! Pure category/subcategory/popular filtering and product sorting.

use super::types::{Article, Category, Product, SortKey};

/// Scope for popular-article selection: the home page uses the global flag,
/// category pages the per-category flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopularScope {
    Home,
    Category(Category),
}

/// Filters articles by exact category match and, when given, exact
/// subcategory match. A missing subcategory (the "ALL" tab) passes every
/// article in the category.
pub fn filter_articles<'a>(
    articles: &'a [Article],
    category: Category,
    subcategory: Option<&str>,
) -> Vec<&'a Article> {
    articles
        .iter()
        .filter(|article| article.category == category.as_str())
        .filter(|article| match subcategory {
            Some(sub) => article.subcategory.as_deref() == Some(sub),
            None => true,
        })
        .collect()
}

/// Selects popular articles for a scope using the explicit flag accessors
/// on `Category`.
pub fn popular_articles<'a>(articles: &'a [Article], scope: PopularScope) -> Vec<&'a Article> {
    articles
        .iter()
        .filter(|article| match scope {
            PopularScope::Home => article.popular,
            PopularScope::Category(category) => category.is_popular(article),
        })
        .collect()
}

/// Filters products by brand (exact, "all" passes everything) and a
/// case-insensitive name search.
pub fn filter_products<'a>(
    products: &'a [Product],
    brand: Option<&str>,
    search: Option<&str>,
) -> Vec<&'a Product> {
    let needle = search.map(|s| s.to_lowercase());
    products
        .iter()
        .filter(|product| match brand {
            Some(b) if !b.eq_ignore_ascii_case("all") => product.brand == b,
            _ => true,
        })
        .filter(|product| match &needle {
            Some(n) => product.name.to_lowercase().contains(n),
            None => true,
        })
        .collect()
}

/// Stable price sort; `Default` keeps the underlying fetch order.
pub fn sort_products(products: &mut [Product], key: SortKey) {
    match key {
        SortKey::Default => {}
        SortKey::PriceLowHigh => products.sort_by_key(|p| p.price),
        SortKey::PriceHighLow => products.sort_by_key(|p| std::cmp::Reverse(p.price)),
    }
}
