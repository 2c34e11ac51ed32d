use serde::{Deserialize, Serialize};

/// Top-level article categories. Each category carries its own
/// "popular within category" flag on the article row; the accessors below
/// are the explicit lookup table for those flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Games,
    Tech,
    Entertainment,
    Gadgets,
    Stocks,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Games,
        Category::Tech,
        Category::Entertainment,
        Category::Gadgets,
        Category::Stocks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Games => "GAMES",
            Category::Tech => "TECH",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Gadgets => "GADGETS",
            Category::Stocks => "STOCKS",
        }
    }

    pub fn parse(s: &str) -> Option<Category> {
        match s.to_ascii_uppercase().as_str() {
            "GAMES" => Some(Category::Games),
            "TECH" => Some(Category::Tech),
            "ENTERTAINMENT" => Some(Category::Entertainment),
            "GADGETS" => Some(Category::Gadgets),
            "STOCKS" => Some(Category::Stocks),
            _ => None,
        }
    }

    /// Column holding the per-category popular flag.
    pub fn popular_flag_column(&self) -> &'static str {
        match self {
            Category::Games => "popular_in_games",
            Category::Tech => "popular_in_tech",
            Category::Entertainment => "popular_in_entertainment",
            Category::Gadgets => "popular_in_gadgets",
            Category::Stocks => "popular_in_stocks",
        }
    }

    /// Reads the per-category popular flag off an article.
    pub fn is_popular(&self, article: &Article) -> bool {
        match self {
            Category::Games => article.popular_in_games,
            Category::Tech => article.popular_in_tech,
            Category::Entertainment => article.popular_in_entertainment,
            Category::Gadgets => article.popular_in_gadgets,
            Category::Stocks => article.popular_in_stocks,
        }
    }
}

/// A blog article row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub author: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub view_count: i64,
    pub featured: bool,
    pub featured_in_category: bool,
    pub popular: bool,
    pub popular_in_games: bool,
    pub popular_in_tech: bool,
    pub popular_in_entertainment: bool,
    pub popular_in_gadgets: bool,
    pub popular_in_stocks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Mobile,
    Laptop,
}

impl ProductKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Mobile => "mobile",
            ProductKind::Laptop => "laptop",
        }
    }

    pub fn parse(s: &str) -> Option<ProductKind> {
        match s.to_ascii_lowercase().as_str() {
            "mobile" => Some(ProductKind::Mobile),
            "laptop" => Some(ProductKind::Laptop),
            _ => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ProductKind::Mobile => "mobile_products",
            ProductKind::Laptop => "laptops",
        }
    }
}

/// A catalog product. Mobiles and laptops share the base spec fields and
/// differ only in the variant-specific columns, which stay `None` for the
/// other kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub kind: ProductKind,
    pub name: String,
    pub brand: String,
    pub model_name: Option<String>,
    pub price: i64,
    pub display_specs: String,
    pub processor: String,
    pub ram: String,
    pub storage: String,
    pub battery: String,
    pub os: Option<String>,
    pub color: Option<String>,
    pub camera: Option<String>,
    pub chipset: Option<String>,
    pub graphics: Option<String>,
    pub ports: Option<String>,
    pub image_url: Option<String>,
    pub gallery_images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Sort order for product listings. Default preserves the fetch order,
/// which is recency-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    Default,
    PriceLowHigh,
    PriceHighLow,
}

impl SortKey {
    pub fn parse(s: &str) -> SortKey {
        match s {
            "price-low-high" => SortKey::PriceLowHigh,
            "price-high-low" => SortKey::PriceHighLow,
            _ => SortKey::Default,
        }
    }
}

/// An expert review, one per product by query pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertReview {
    pub id: i64,
    pub product_id: i64,
    pub rating: f64,
    pub author: String,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub verdict: String,
    pub created_at: String,
}

/// An anonymous user review with its accompanying star rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReview {
    pub id: i64,
    pub product_id: i64,
    pub rating: i64,
    pub user_name: String,
    pub review_text: String,
    pub created_at: String,
}
