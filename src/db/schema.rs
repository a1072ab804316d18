//! Database schema and types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat-assigned identity of a user
pub type UserId = i64;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    identity INTEGER PRIMARY KEY,
    display_name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_text TEXT NOT NULL UNIQUE CHECK (length(source_text) > 0),
    target_text TEXT NOT NULL UNIQUE CHECK (length(target_text) > 0)
);

CREATE TABLE IF NOT EXISTS user_words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_identity INTEGER NOT NULL,
    source_text TEXT NOT NULL CHECK (length(source_text) > 0),
    target_text TEXT NOT NULL CHECK (length(target_text) > 0),

    UNIQUE (user_identity, source_text),
    UNIQUE (user_identity, target_text),
    FOREIGN KEY (user_identity) REFERENCES users(identity) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_user_words_user ON user_words(user_identity, id);
";

/// Starter vocabulary for the global pool
pub const DEFAULT_GLOBAL_WORDS: &[(&str, &str)] = &[
    ("Здравствуйте", "Hello"),
    ("До свидания", "Goodbye"),
    ("Красный", "Red"),
    ("Синий", "Blue"),
    ("Зеленый", "Green"),
    ("Желтый", "Yellow"),
    ("Черный", "Black"),
    ("Белый", "White"),
    ("Я", "I"),
    ("Ты", "You"),
    ("Он", "He"),
    ("Она", "She"),
    ("Яблоко", "Apple"),
    ("Книга", "Book"),
    ("Кот", "Cat"),
    ("Собака", "Dog"),
    ("Цветок", "Flower"),
    ("Слон", "Elephant"),
    ("Дом", "House"),
    ("Мороженое", "Ice cream"),
    ("Сок", "Juice"),
    ("Ключ", "Key"),
    ("Лев", "Lion"),
    ("Гора", "Mountain"),
    ("Блокнот", "Notebook"),
    ("Апельсин", "Orange"),
    ("Карандаш", "Pencil"),
    ("Королева", "Queen"),
    ("Река", "River"),
    ("Солнце", "Sun"),
    ("Дерево", "Tree"),
    ("Зонт", "Umbrella"),
    ("Скрипка", "Violin"),
    ("Окно", "Window"),
    ("Двор", "Yard"),
    ("Зебра", "Zebra"),
    ("Друг", "Friend"),
    ("Счастливый", "Happy"),
    ("Любовь", "Love"),
    ("Музыка", "Music"),
    ("Вода", "Water"),
];

/// A vocabulary pair: native word and its translation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WordPair {
    pub source_text: String,
    pub target_text: String,
}

impl WordPair {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

impl fmt::Display for WordPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_text, self.target_text)
    }
}

/// Registered user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub identity: UserId,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}
