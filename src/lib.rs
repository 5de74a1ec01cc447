//! A photo gallery web application: accounts with remember-token sessions,
//! per-user galleries and image uploads stored on disk.

pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod state;
pub mod views;

pub mod crypto {
    pub mod csrf;
    pub mod keyed_hash;
    pub mod password;
    pub mod token;
}

pub mod models {
    pub mod gallery;
    pub mod image;
    pub mod user;
}

pub mod repositories {
    pub mod gallery;
    pub mod memory;
    pub mod user;
}

pub mod services {
    pub mod galleries;
    pub mod images;
    pub mod users;
}

pub mod handlers {
    pub mod galleries;
    pub mod images;
    pub mod pages;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
}

pub mod validation {
    pub mod auth;
}
