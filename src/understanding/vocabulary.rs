// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Seed vocabulary: the static data every store starts from.
//!
//! Nothing here is consulted directly at query time. The dictionary, synonym
//! store, transliteration lexicon and gazetteers copy what they need at
//! construction, then grow through their own learning APIs. Keeping the raw
//! tables in one place makes it easy to see why "biriani" corrects to
//! "biryani" and not to "biriyani" (frequency 120 vs 30).

/// Frequency assigned to synonym forms that are not already dictionary words.
///
/// Low enough that a canonical spelling always wins a distance tie, high
/// enough that the form itself is never "corrected" away.
pub const SYNONYM_FORM_FREQUENCY: u64 = 30;

/// Core spelling dictionary: `(word, frequency)`.
pub const DICTIONARY_SEED: &[(&str, u64)] = &[
    // Dishes
    ("chicken", 150),
    ("biryani", 120),
    ("paneer", 110),
    ("pizza", 140),
    ("burger", 120),
    ("dosa", 90),
    ("idli", 80),
    ("samosa", 85),
    ("momos", 95),
    ("noodles", 90),
    ("fried", 70),
    ("rice", 100),
    ("roll", 70),
    ("rolls", 60),
    ("thali", 80),
    ("tikka", 85),
    ("masala", 100),
    ("butter", 95),
    ("naan", 75),
    ("roti", 80),
    ("paratha", 75),
    ("kebab", 70),
    ("shawarma", 65),
    ("sandwich", 80),
    ("pasta", 70),
    ("fries", 70),
    ("cake", 90),
    ("pastry", 60),
    ("lassi", 55),
    ("coffee", 90),
    ("juice", 70),
    ("shake", 60),
    ("icecream", 40),
    ("cream", 60),
    ("chaat", 60),
    ("bhaji", 55),
    ("vada", 60),
    ("misal", 50),
    ("pohe", 45),
    ("upma", 40),
    ("modak", 40),
    ("shrikhand", 35),
    ("gulab", 55),
    ("jamun", 55),
    ("rasgulla", 50),
    ("jalebi", 50),
    ("ladoo", 45),
    ("kulfi", 40),
    ("halwa", 45),
    ("kheer", 40),
    ("soup", 55),
    ("salad", 55),
    ("gravy", 60),
    ("curry", 85),
    ("mutton", 90),
    ("fish", 80),
    ("prawns", 50),
    ("egg", 80),
    ("eggs", 50),
    ("dal", 70),
    ("makhani", 55),
    ("manchurian", 55),
    ("schezwan", 45),
    ("tandoori", 65),
    ("korma", 40),
    ("pulao", 45),
    ("khichdi", 40),
    ("sweets", 100),
    ("sweet", 70),
    ("mithai", 60),
    ("milk", 90),
    ("bread", 80),
    ("water", 60),
    ("tea", 70),
    ("potato", 60),
    ("onion", 55),
    ("tomato", 55),
    ("atta", 50),
    ("sugar", 55),
    ("oil", 50),
    ("medicine", 45),
    ("tablet", 40),
    // Categories, cuisines, diets
    ("desserts", 60),
    ("snacks", 70),
    ("beverages", 50),
    ("drinks", 60),
    ("starters", 50),
    ("breakfast", 60),
    ("lunch", 60),
    ("dinner", 65),
    ("grocery", 55),
    ("groceries", 45),
    ("vegetables", 50),
    ("fruits", 50),
    ("dairy", 40),
    ("chinese", 75),
    ("italian", 50),
    ("indian", 70),
    ("north", 45),
    ("south", 50),
    ("mughlai", 35),
    ("punjabi", 40),
    ("maharashtrian", 30),
    ("continental", 30),
    ("veg", 120),
    ("vegetarian", 60),
    ("vegan", 40),
    ("jain", 35),
    ("eggless", 35),
    ("nonveg", 60),
    ("healthy", 45),
    // Stores
    ("restaurant", 80),
    ("restaurants", 60),
    ("cafe", 70),
    ("hotel", 60),
    ("dhaba", 50),
    ("bakery", 55),
    ("kitchen", 45),
    ("shop", 50),
    ("store", 55),
    ("mart", 40),
    ("pharmacy", 40),
    ("medical", 35),
    // Query words
    ("near", 90),
    ("nearby", 60),
    ("around", 40),
    ("under", 80),
    ("below", 50),
    ("above", 40),
    ("cheap", 60),
    ("cheapest", 40),
    ("budget", 40),
    ("best", 90),
    ("popular", 50),
    ("spicy", 50),
    ("combo", 45),
    ("offer", 40),
    ("offers", 45),
    ("delivery", 50),
    ("home", 40),
    ("party", 40),
    ("birthday", 35),
    ("office", 30),
    ("people", 40),
    ("plates", 30),
    ("tonight", 25),
    ("morning", 25),
    ("with", 80),
    ("from", 80),
    ("and", 90),
    ("for", 90),
    ("the", 90),
    // Hinglish / Marathi function words
    ("mangao", 40),
    ("mangwao", 30),
    ("chahiye", 40),
    ("wala", 45),
    ("wali", 40),
    ("wale", 30),
    ("khana", 50),
    ("aur", 40),
    ("nahi", 30),
    ("accha", 30),
    ("abhi", 30),
    ("kuch", 30),
    ("bhi", 30),
    ("pahije", 25),
    ("ani", 25),
];

/// Bidirectional synonym groups: `(canonical, forms)`.
///
/// The canonical is a form of its own group. No form may appear in two groups.
pub const SYNONYM_GROUPS: &[(&str, &[&str])] = &[
    ("chicken", &["murgi", "murg", "chikan", "kombdi", "kukkad"]),
    ("gravy", &["curry", "salan", "rassa", "tari"]),
    ("biryani", &["biriyani", "briyani", "biryanee", "biriyaani"]),
    ("sweets", &["mithai", "sweet", "sww", "swt", "mitha"]),
    ("paneer", &["panner", "panir", "cottage"]),
    ("veg", &["vegetarian", "veggie", "shakahari", "shakahaari", "pureveg"]),
    ("nonveg", &["non-veg", "mansahari", "nv"]),
    ("egg", &["anda", "ande", "eggs"]),
    ("potato", &["aloo", "alu", "batata"]),
    ("onion", &["pyaz", "pyaaz", "kanda"]),
    ("tomato", &["tamatar"]),
    ("milk", &["doodh", "dudh"]),
    ("bread", &["pav", "pao", "double-roti"]),
    ("water", &["pani", "paani"]),
    ("tea", &["chai", "chaha"]),
    ("coffee", &["kaafi", "kofi"]),
    ("rice", &["chawal", "bhaat", "bhat"]),
    ("dal", &["daal", "dhal", "varan"]),
    ("mutton", &["gosht", "bakra", "goat"]),
    ("fish", &["machli", "macchi", "masa"]),
    ("fried", &["tala", "tali", "fry"]),
    ("spicy", &["teekha", "tikha", "masaledar"]),
    ("cheap", &["sasta", "affordable", "budget"]),
    ("medicine", &["dawa", "dawai", "aushadh"]),
    ("grocery", &["kirana", "ration"]),
    ("icecream", &["ice-cream", "kulfi"]),
    ("momos", &["momo", "dumplings"]),
    ("food", &["khana", "jevan", "bhojan"]),
];

/// Devanagari words and phrases with a preferred Latin spelling.
///
/// Checked before the character map; "चिकन" would otherwise come out as
/// "chikana" because every bare consonant carries an implicit vowel.
pub const FOOD_LEXICON: &[(&str, &str)] = &[
    ("चिकन", "chicken"),
    ("बिरयानी", "biryani"),
    ("बिरियानी", "biryani"),
    ("पनीर", "paneer"),
    ("मिठाई", "mithai"),
    ("दूध", "doodh"),
    ("चाय", "chai"),
    ("समोसा", "samosa"),
    ("आलू", "aloo"),
    ("पिज़्ज़ा", "pizza"),
    ("पिज्जा", "pizza"),
    ("बर्गर", "burger"),
    ("डोसा", "dosa"),
    ("इडली", "idli"),
    ("वडा", "vada"),
    ("वड़ा", "vada"),
    ("पाव", "pav"),
    ("भाजी", "bhaji"),
    ("मटन", "mutton"),
    ("मछली", "machli"),
    ("अंडा", "anda"),
    ("दाल", "dal"),
    ("चावल", "chawal"),
    ("रोटी", "roti"),
    ("नान", "naan"),
    ("थाली", "thali"),
    ("लस्सी", "lassi"),
    ("कॉफ़ी", "coffee"),
    ("कॉफी", "coffee"),
    ("केक", "cake"),
    ("आइसक्रीम", "icecream"),
    ("मोमोज", "momos"),
    ("नूडल्स", "noodles"),
    ("शाकाहारी", "veg"),
    ("मांसाहारी", "nonveg"),
    ("कोंबडी", "kombdi"),
    ("भात", "bhaat"),
    ("मिसळ", "misal"),
    ("पोहे", "pohe"),
    ("मोदक", "modak"),
    ("श्रीखंड", "shrikhand"),
    ("वडा पाव", "vada pav"),
    ("पाव भाजी", "pav bhaji"),
    ("गुलाब जामुन", "gulab jamun"),
];

/// Restaurant and cafe chains recognized as store references.
pub const CHAIN_BRANDS: &[&str] = &[
    "kfc",
    "mcdonalds",
    "mcd",
    "dominos",
    "pizza hut",
    "subway",
    "starbucks",
    "burger king",
    "taco bell",
    "dunkin",
    "baskin robbins",
    "papa johns",
    "costa coffee",
    "krispy kreme",
    "haldiram",
    "haldirams",
    "bikanervala",
    "barbeque nation",
    "wow momo",
    "behrouz",
    "faasos",
    "chaayos",
    "cafe coffee day",
    "ccd",
    "theobroma",
    "paradise",
    "mainland china",
];

/// Packaged-goods brands. These drive the brand intent, not store targeting.
pub const PRODUCT_BRANDS: &[&str] = &[
    "amul",
    "britannia",
    "nestle",
    "maggi",
    "parle",
    "cadbury",
    "lays",
    "kurkure",
    "tata",
    "aashirvaad",
    "mother dairy",
    "patanjali",
    "dabur",
    "himalaya",
    "colgate",
    "bisleri",
];

/// Words that name a kind of store.
pub const STORE_KEYWORDS: &[&str] = &[
    "restaurant",
    "restaurants",
    "restro",
    "cafe",
    "café",
    "hotel",
    "dhaba",
    "bakery",
    "bakers",
    "kitchen",
    "shop",
    "store",
    "mart",
    "canteen",
    "mess",
    "outlet",
    "pharmacy",
    "medical",
    "chemist",
    "supermarket",
    "bhojnalaya",
    "caterers",
    "bistro",
    "eatery",
];

/// Browseable categories (not individual dishes).
pub const CATEGORY_KEYWORDS: &[&str] = &[
    "sweets",
    "desserts",
    "snacks",
    "beverages",
    "drinks",
    "starters",
    "breakfast",
    "groceries",
    "grocery",
    "vegetables",
    "fruits",
    "dairy",
    "bakery",
    "medicines",
    "fast food",
    "street food",
];

pub const CUISINE_KEYWORDS: &[&str] = &[
    "north indian",
    "south indian",
    "chinese",
    "italian",
    "mughlai",
    "punjabi",
    "maharashtrian",
    "gujarati",
    "continental",
    "thai",
    "mexican",
    "hyderabadi",
];

/// Dish words that make a query look like an item search.
pub const DISH_WORDS: &[&str] = &[
    "biryani", "chicken", "paneer", "pizza", "burger", "dosa", "idli", "samosa", "momos",
    "noodles", "rice", "roll", "thali", "tikka", "naan", "roti", "paratha", "kebab", "shawarma",
    "sandwich", "pasta", "fries", "cake", "pastry", "lassi", "coffee", "tea", "juice", "shake",
    "icecream", "chaat", "bhaji", "vada", "misal", "pohe", "modak", "gulab", "jalebi", "soup",
    "salad", "gravy", "mutton", "fish", "prawns", "egg", "dal", "manchurian", "pulao", "khichdi",
    "milk", "bread",
];

pub const PRICE_WORDS: &[&str] = &[
    "cheap", "cheapest", "budget", "affordable", "sasta", "expensive", "premium", "price",
    "cost", "offer", "offers", "discount", "deal", "deals", "combo",
];

pub const GENERAL_WORDS: &[&str] = &[
    "food", "something", "anything", "hungry", "eat", "khana", "kuch", "order", "options",
    "recommend", "suggest", "trending", "popular",
];

pub const OCCASION_WORDS: &[&str] = &[
    "party",
    "birthday",
    "anniversary",
    "office",
    "wedding",
    "festival",
    "diwali",
    "holi",
    "picnic",
    "get together",
];
