//! Side-by-side comparison of up to three products of one kind.

use serde::Serialize;

use super::types::{Product, ProductKind};

pub const MAX_COMPARED: usize = 3;

/// Marker rendered for attributes a product does not carry, keeping
/// columns aligned across the table.
pub const NOT_AVAILABLE: &str = "N/A";

/// Outcome of trying to add a product to the selector. `AlreadySelected`
/// and `Full` are no-ops surfaced to the caller as a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadySelected,
    Full,
}

/// One row of the comparison table: a spec label and one value per
/// selected product, in selection order.
#[derive(Debug, Clone, Serialize)]
pub struct SpecRow {
    pub label: &'static str,
    pub values: Vec<String>,
}

/// Bounded selection of products for comparison. The first product is the
/// anchor and cannot be removed.
#[derive(Debug)]
pub struct ComparisonSelector {
    kind: ProductKind,
    products: Vec<Product>,
}

impl ComparisonSelector {
    pub fn new(anchor: Product) -> Self {
        ComparisonSelector {
            kind: anchor.kind,
            products: vec![anchor],
        }
    }

    pub fn add(&mut self, product: Product) -> AddOutcome {
        if self.products.iter().any(|p| p.id == product.id) {
            return AddOutcome::AlreadySelected;
        }
        if self.products.len() >= MAX_COMPARED {
            return AddOutcome::Full;
        }
        self.products.push(product);
        AddOutcome::Added
    }

    /// Removes a candidate by id. Removing the anchor is a no-op.
    pub fn remove(&mut self, product_id: i64) -> bool {
        let Some(pos) = self.products.iter().position(|p| p.id == product_id) else {
            return false;
        };
        if pos == 0 {
            return false;
        }
        self.products.remove(pos);
        true
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Builds the row-major comparison table over the fixed attribute list
    /// for this product kind.
    pub fn table(&self) -> Vec<SpecRow> {
        spec_labels(self.kind)
            .iter()
            .map(|&(label, accessor)| SpecRow {
                label,
                values: self
                    .products
                    .iter()
                    .map(|p| accessor(p).unwrap_or_else(|| NOT_AVAILABLE.to_string()))
                    .collect(),
            })
            .collect()
    }
}

type SpecAccessor = fn(&Product) -> Option<String>;

const BASE_SPECS: [(&str, SpecAccessor); 10] = [
    ("Price", |p| Some(p.price.to_string())),
    ("Brand", |p| Some(p.brand.clone())),
    ("Model", |p| p.model_name.clone()),
    ("Display", |p| Some(p.display_specs.clone())),
    ("Processor", |p| Some(p.processor.clone())),
    ("RAM", |p| Some(p.ram.clone())),
    ("Storage", |p| Some(p.storage.clone())),
    ("Battery", |p| Some(p.battery.clone())),
    ("OS", |p| p.os.clone()),
    ("Color", |p| p.color.clone()),
];

const MOBILE_SPECS: [(&str, SpecAccessor); 2] = [
    ("Camera", |p| p.camera.clone()),
    ("Chipset", |p| p.chipset.clone()),
];

const LAPTOP_SPECS: [(&str, SpecAccessor); 2] = [
    ("Graphics", |p| p.graphics.clone()),
    ("Ports", |p| p.ports.clone()),
];

fn spec_labels(kind: ProductKind) -> Vec<(&'static str, SpecAccessor)> {
    let variant = match kind {
        ProductKind::Mobile => &MOBILE_SPECS,
        ProductKind::Laptop => &LAPTOP_SPECS,
    };
    BASE_SPECS.iter().chain(variant.iter()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(id: i64, name: &str, price: i64) -> Product {
        Product {
            id,
            kind: ProductKind::Mobile,
            name: name.to_string(),
            brand: "Acme".to_string(),
            model_name: Some(name.to_string()),
            price,
            display_specs: "6.1\" OLED".to_string(),
            processor: "Octa-core".to_string(),
            ram: "8GB".to_string(),
            storage: "128GB".to_string(),
            battery: "4500mAh".to_string(),
            os: None,
            color: None,
            camera: Some("50MP".to_string()),
            chipset: None,
            graphics: None,
            ports: None,
            image_url: None,
            gallery_images: Vec::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn selector_never_exceeds_capacity() {
        let mut selector = ComparisonSelector::new(phone(1, "anchor", 50000));
        assert_eq!(selector.add(phone(2, "b", 60000)), AddOutcome::Added);
        assert_eq!(selector.add(phone(3, "c", 45000)), AddOutcome::Added);
        assert_eq!(selector.add(phone(4, "d", 30000)), AddOutcome::Full);
        assert_eq!(selector.products().len(), 3);
    }

    #[test]
    fn duplicate_add_is_a_notice() {
        let mut selector = ComparisonSelector::new(phone(1, "anchor", 50000));
        selector.add(phone(2, "b", 60000));
        assert_eq!(selector.add(phone(2, "b", 60000)), AddOutcome::AlreadySelected);
        assert_eq!(selector.products().len(), 2);
    }

    #[test]
    fn anchor_cannot_be_removed() {
        let mut selector = ComparisonSelector::new(phone(1, "anchor", 50000));
        selector.add(phone(2, "b", 60000));
        assert!(!selector.remove(1));
        assert!(selector.remove(2));
        assert_eq!(selector.products().len(), 1);
        assert_eq!(selector.products()[0].id, 1);
    }

    #[test]
    fn removing_one_candidate_keeps_the_other() {
        let mut selector = ComparisonSelector::new(phone(1, "anchor", 50000));
        selector.add(phone(2, "pricier", 60000));
        selector.add(phone(3, "cheaper", 45000));

        assert!(selector.remove(2));

        let remaining: Vec<i64> = selector.products().iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![1, 3]);

        // Two data columns besides the label column.
        let table = selector.table();
        assert!(table.iter().all(|row| row.values.len() == 2));
        let price_row = table.iter().find(|row| row.label == "Price").unwrap();
        assert_eq!(price_row.values, vec!["50000", "45000"]);
    }

    #[test]
    fn missing_values_render_as_explicit_marker() {
        let mut anchor = phone(1, "anchor", 50000);
        anchor.os = None;
        anchor.chipset = None;
        let selector = ComparisonSelector::new(anchor);

        let table = selector.table();
        let os_row = table.iter().find(|row| row.label == "OS").unwrap();
        assert_eq!(os_row.values, vec![NOT_AVAILABLE]);
        let chipset_row = table.iter().find(|row| row.label == "Chipset").unwrap();
        assert_eq!(chipset_row.values, vec![NOT_AVAILABLE]);
    }

    #[test]
    fn laptop_table_carries_laptop_rows() {
        let mut laptop = phone(1, "book", 80000);
        laptop.kind = ProductKind::Laptop;
        laptop.graphics = Some("RTX 4060".to_string());
        let selector = ComparisonSelector::new(laptop);

        let labels: Vec<&str> = selector.table().iter().map(|row| row.label).collect();
        assert!(labels.contains(&"Graphics"));
        assert!(labels.contains(&"Ports"));
        assert!(!labels.contains(&"Camera"));
    }
}
