use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use rust_decimal::Decimal;

static PRODUCT_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProductId(pub u64);

impl ProductId {
    pub fn next() -> Self {
        Self(PRODUCT_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "product-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProductStatus {
    Live,
    Draft,
    OutOfStock,
}

impl ProductStatus {
    /// Status a freshly listed product gets for its stock level.
    pub fn for_stock(stock: u32) -> Self {
        if stock > 0 { Self::Live } else { Self::OutOfStock }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Draft => "Draft",
            Self::OutOfStock => "Out of stock",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub stock: u32,
    pub status: ProductStatus,
    pub image_url: Option<String>,
    pub description: String,
    pub handcrafted: bool,
    pub specs: Vec<String>,
    pub size_eu: Option<String>,
    pub size_clothing: Option<String>,
}

struct SeedProduct {
    name: &'static str,
    sku: &'static str,
    price: i64,
    stock: u32,
    image_url: &'static str,
    description: &'static str,
    handcrafted: bool,
    specs: [&'static str; 3],
}

const SEED_PRODUCTS: [SeedProduct; 3] = [
    SeedProduct {
        name: "Handwoven Dhaka Scarf",
        sku: "DHK-241",
        price: 1800,
        stock: 18,
        image_url: "assets/P1.png",
        description: "Handwoven Dhaka scarf crafted with natural fibres for everyday wear and \
                      home styling.",
        handcrafted: true,
        specs: [
            "Premium natural fibres with soft touch",
            "Designed for everyday wear and home styling",
            "Made in Nepal with traditional techniques",
        ],
    },
    SeedProduct {
        name: "Himalayan Organic Tea Pack",
        sku: "TEA-112",
        price: 950,
        stock: 42,
        image_url: "assets/P2.png",
        description: "Assorted Himalayan organic teas sourced from high altitude family farms.",
        handcrafted: false,
        specs: [
            "Organic tea leaves from high altitude farms",
            "Balanced selection of flavours for daily use",
            "Packed in eco-conscious materials",
        ],
    },
    SeedProduct {
        name: "Lokta Paper Journal",
        sku: "LKT-089",
        price: 550,
        stock: 0,
        image_url: "assets/p3.png",
        description: "Lokta paper journal with textured cover, ideal for sketching and \
                      journaling.",
        handcrafted: true,
        specs: [
            "Lokta paper pages with natural texture",
            "Suitable for sketching, journaling and gifts",
            "Handcrafted by local artisans in Nepal",
        ],
    },
];

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog has no product {0}")]
    UnknownProduct(ProductId),
}

/// Listings shown on the seller's product page, newest first.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The storefront's sample listings.
    pub fn with_seed() -> Self {
        let products = SEED_PRODUCTS
            .iter()
            .map(|seed| Product {
                id: ProductId::next(),
                name: seed.name.to_string(),
                sku: seed.sku.to_string(),
                price: Decimal::from(seed.price),
                stock: seed.stock,
                status: ProductStatus::for_stock(seed.stock),
                image_url: Some(seed.image_url.to_string()),
                description: seed.description.to_string(),
                handcrafted: seed.handcrafted,
                specs: seed.specs.iter().map(ToString::to_string).collect(),
                size_eu: None,
                size_clothing: None,
            })
            .collect();
        Self { products }
    }

    pub fn prepend(&mut self, product: Product) {
        tracing::info!(product = %product.id, sku = %product.sku, "product listed");
        self.products.insert(0, product);
    }

    pub fn remove(&mut self, id: ProductId) -> Result<Product, CatalogError> {
        let index = self
            .products
            .iter()
            .position(|product| product.id == id)
            .ok_or(CatalogError::UnknownProduct(id))?;
        let removed = self.products.remove(index);
        tracing::info!(product = %id, sku = %removed.sku, "product removed");
        Ok(removed)
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.products
            .iter()
            .filter(|product| product.status == ProductStatus::Live)
            .count()
    }

    pub fn out_of_stock_count(&self) -> usize {
        self.products
            .iter()
            .filter(|product| product.stock == 0)
            .count()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
