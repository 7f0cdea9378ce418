use dioxus::prelude::*;

mod components;
mod config;
mod db;
mod diagnostics;
mod utils;

use components::Home;

const FAVICON: Asset = asset!("/assets/favicon.svg");
const APP_CSS: Asset = asset!("/assets/styling/app.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "set @eugeniosaintemarie" }
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Meta { name: "theme-color", content: "#0b0f14" }

        // Roboto 400/700
        document::Link { rel: "preconnect", href: "https://fonts.googleapis.com" }
        document::Link {
            rel: "stylesheet",
            href: "https://fonts.googleapis.com/css2?family=Roboto:wght@400;700&display=swap",
        }

        document::Stylesheet { href: APP_CSS }

        Home {}
    }
}
