use askama::Template;

use super::Page;
use crate::models::{gallery::Gallery, image::Image};

#[derive(Template)]
#[template(path = "home.html", escape = "html")]
pub struct HomeTemplate {
    pub page: Page,
}

#[derive(Template)]
#[template(path = "contact.html", escape = "html")]
pub struct ContactTemplate {
    pub page: Page,
}

/// The signup form, echoing back what was submitted on failure.
#[derive(Template)]
#[template(path = "users/signup.html", escape = "html")]
pub struct SignupTemplate {
    pub page: Page,
    pub name: String,
    pub email: String,
}

impl SignupTemplate {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            name: String::new(),
            email: String::new(),
        }
    }
}

#[derive(Template)]
#[template(path = "users/login.html", escape = "html")]
pub struct LoginTemplate {
    pub page: Page,
    pub email: String,
}

#[derive(Template)]
#[template(path = "galleries/index.html", escape = "html")]
pub struct GalleriesIndexTemplate {
    pub page: Page,
    pub galleries: Vec<Gallery>,
}

#[derive(Template)]
#[template(path = "galleries/new.html", escape = "html")]
pub struct NewGalleryTemplate {
    pub page: Page,
    pub title: String,
}

#[derive(Template)]
#[template(path = "galleries/edit.html", escape = "html")]
pub struct EditGalleryTemplate {
    pub page: Page,
    pub gallery: Gallery,
    pub images: Vec<Image>,
}

#[derive(Template)]
#[template(path = "galleries/show.html", escape = "html")]
pub struct ShowGalleryTemplate {
    pub page: Page,
    pub gallery: Gallery,
    pub images: Vec<Image>,
}
