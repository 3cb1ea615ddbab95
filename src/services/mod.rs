// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external collaborators and encoding helpers.

pub mod auth;
pub mod firebase_auth;
pub mod image;
pub mod picker;

pub use auth::{AuthService, Identity, MemoryAuth, Session};
pub use firebase_auth::FirebaseAuth;
pub use self::image::{decode_image, encode_image, encode_resource, DecodedImage, ImageFormat};
pub use picker::{FileResourcePicker, ResourceHandle, ResourcePicker};
