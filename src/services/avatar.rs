// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gravatar image markup for a user's email.

use sha2::{Digest, Sha256};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

pub const DEFAULT_SIZE: u32 = 80;
pub const DEFAULT_RATING: &str = "g";

/// Gravatar image URL for `email`.
///
/// The hash is SHA-256 of the trimmed, lowercased address.
pub fn avatar_url(email: &str, size: u32, rating: &str, default_image: &str) -> String {
    let hash = hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()));
    format!(
        "{}{}?s={}&r={}&d={}",
        GRAVATAR_BASE,
        hash,
        size,
        urlencoding::encode(rating),
        urlencoding::encode(default_image)
    )
}

/// Linked `<img>` tag for `email`, ready to embed in a page.
pub fn gravatar(email: &str, size: u32, rating: &str, default_image: &str) -> String {
    let url = avatar_url(email, size, rating, default_image).replace('&', "&amp;");
    format!(
        r#"<a href="https://www.gravatar.com/"><img src="{}" alt="gravatar" /></a>"#,
        url
    )
}
