//! Place categories and the registry that maps provider tags onto them.
//!
//! The registry is built once and shared by reference; nothing here is
//! mutable after construction. Registration order matters: a place's main
//! category is the first registered category its tags match.

use std::collections::{HashMap, HashSet};

/// Stay duration assumed for a place that matches no registered category.
pub const DEFAULT_STAY_MINUTES: u32 = 30;

/// A named group of provider sub-type tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub display_name: &'static str,
    pub sub_types: &'static [&'static str],
    pub stay_minutes: u32,
}

impl Category {
    /// Whether any of `tags` is one of this category's sub-types.
    pub fn matches<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter()
            .any(|tag| self.sub_types.contains(&tag.as_ref()))
    }
}

pub const AMUSEMENTS: Category = Category {
    name: "amusements",
    display_name: "Amusements",
    sub_types: &[
        "amusement_park",
        "aquarium",
        "bowling_alley",
        "movie_theater",
    ],
    stay_minutes: 60,
};

pub const BAKERY: Category = Category {
    name: "bakery",
    display_name: "Bakery",
    sub_types: &["bakery"],
    stay_minutes: 20,
};

pub const BOOK_STORE: Category = Category {
    name: "book_store",
    display_name: "Books",
    sub_types: &["book_store", "library"],
    stay_minutes: 30,
};

pub const CAFE: Category = Category {
    name: "cafe",
    display_name: "Cafe",
    sub_types: &["cafe"],
    stay_minutes: 30,
};

pub const MUSEUM: Category = Category {
    name: "museum",
    display_name: "Museum",
    sub_types: &["art_gallery", "museum"],
    stay_minutes: 60,
};

pub const NATURAL: Category = Category {
    name: "natural",
    display_name: "Nature",
    sub_types: &["park", "natural_feature", "campground"],
    stay_minutes: 30,
};

pub const RESTAURANT: Category = Category {
    name: "restaurant",
    display_name: "Restaurant",
    sub_types: &["restaurant", "meal_takeaway"],
    stay_minutes: 60,
};

pub const SHOPPING: Category = Category {
    name: "shopping",
    display_name: "Shopping",
    sub_types: &[
        "clothing_store",
        "department_store",
        "shopping_mall",
        "shoe_store",
        "jewelry_store",
        "home_goods_store",
        "furniture_store",
        "store",
    ],
    stay_minutes: 30,
};

pub const TEMPLE: Category = Category {
    name: "temple",
    display_name: "Temples and Shrines",
    sub_types: &[
        "place_of_worship",
        "church",
        "hindu_temple",
        "mosque",
        "synagogue",
    ],
    stay_minutes: 20,
};

pub const ZOO: Category = Category {
    name: "zoo",
    display_name: "Zoo",
    sub_types: &["zoo"],
    stay_minutes: 60,
};

pub const SPA: Category = Category {
    name: "spa",
    display_name: "Spa",
    sub_types: &["spa"],
    stay_minutes: 60,
};

/// Tags that are never recommended, whatever else the place matches.
pub const IGNORED_TAGS: &[&str] = &[
    "accounting",
    "airport",
    "atm",
    "bank",
    "bus_station",
    "car_dealer",
    "car_rental",
    "car_repair",
    "car_wash",
    "cemetery",
    "courthouse",
    "dentist",
    "doctor",
    "fire_station",
    "funeral_home",
    "gas_station",
    "hospital",
    "insurance_agency",
    "laundry",
    "lawyer",
    "light_rail_station",
    "local_government_office",
    "parking",
    "police",
    "post_office",
    "primary_school",
    "real_estate_agency",
    "school",
    "secondary_school",
    "storage",
    "subway_station",
    "taxi_stand",
    "train_station",
    "transit_station",
    "university",
];

/// Immutable lookup table from provider tags to categories.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
    by_tag: HashMap<&'static str, Vec<usize>>,
    by_name: HashMap<&'static str, usize>,
    ignored: HashSet<&'static str>,
}

impl CategoryRegistry {
    /// Build a registry. Categories keep the given order.
    pub fn new(categories: Vec<Category>, ignored_tags: &[&'static str]) -> Self {
        let mut by_tag: HashMap<&'static str, Vec<usize>> = HashMap::new();
        let mut by_name = HashMap::new();
        for (index, category) in categories.iter().enumerate() {
            by_name.entry(category.name).or_insert(index);
            for tag in category.sub_types {
                by_tag.entry(*tag).or_default().push(index);
            }
        }
        Self {
            categories,
            by_tag,
            by_name,
            ignored: ignored_tags.iter().copied().collect(),
        }
    }

    /// The standard set of recommendable categories.
    pub fn standard() -> Self {
        Self::new(
            vec![
                AMUSEMENTS, BAKERY, BOOK_STORE, CAFE, MUSEUM, NATURAL, RESTAURANT, SHOPPING,
                TEMPLE, ZOO, SPA,
            ],
            IGNORED_TAGS,
        )
    }

    /// All categories in registration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.by_name.get(name).map(|&i| &self.categories[i])
    }

    /// Categories matching `tags`, in registration order, without repeats.
    pub fn categories_of<S: AsRef<str>>(&self, tags: &[S]) -> Vec<&Category> {
        let mut indices: Vec<usize> = tags
            .iter()
            .filter_map(|tag| self.by_tag.get(tag.as_ref()))
            .flatten()
            .copied()
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices.into_iter().map(|i| &self.categories[i]).collect()
    }

    /// First registered category matching `tags`.
    pub fn main_category<S: AsRef<str>>(&self, tags: &[S]) -> Option<&Category> {
        tags.iter()
            .filter_map(|tag| self.by_tag.get(tag.as_ref()))
            .flatten()
            .min()
            .map(|&i| &self.categories[i])
    }

    /// Whether any tag is on the never-recommend list.
    pub fn is_ignored<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.ignored.contains(tag.as_ref()))
    }

    /// Stay duration for a place with `tags`.
    pub fn stay_minutes<S: AsRef<str>>(&self, tags: &[S]) -> u32 {
        self.main_category(tags)
            .map_or(DEFAULT_STAY_MINUTES, |c| c.stay_minutes)
    }

    /// Resolve category names, dropping unknown ones.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Vec<&Category> {
        names
            .iter()
            .filter_map(|name| self.get(name.as_ref()))
            .collect()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
