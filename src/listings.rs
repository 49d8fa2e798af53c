use std::str::FromStr;

use html_escape::{encode_double_quoted_attribute, encode_text};
use rand::Rng;

use crate::constants::{DEFAULT_LISTING_PICTURE, ICON_BUILDING, ICON_HOUSE, RANDOM_SPREAD_DEG};
use crate::geo::LatLng;
use crate::markers::{Marker, MarkerId, MarkerStore};

/// Builds the info-window HTML shown when hovering a listing.
pub fn listing_html(title: &str, subtitle: &str, price: &str, picture: &str) -> String {
    format!(
        r#"
    <table>
      <tr>
        <td><img src="{}" width="180"></td>
        <td>
          <h1>{}</h1>
          <h3>{}</h3>
          {}
        </td>
      </tr>
    </table>"#,
        encode_double_quoted_attribute(picture),
        encode_text(title),
        encode_text(subtitle),
        encode_text(price)
    )
}

/// A made-up listing scattered around `center`. `n` numbers the listing.
pub fn random_listing<R: Rng + ?Sized>(n: usize, center: LatLng, rng: &mut R) -> Marker {
    let position = LatLng::new(
        center.lat + rng.gen_range(-RANDOM_SPREAD_DEG..RANDOM_SPREAD_DEG),
        center.lng + rng.gen_range(-RANDOM_SPREAD_DEG..RANDOM_SPREAD_DEG),
    );
    let info = listing_html(
        &format!("Titre annonce {}", n),
        &format!("Sous-titre annonce {}", n),
        "Prix de location/vente",
        DEFAULT_LISTING_PICTURE,
    );
    Marker::new(position, format!("Prix {}", n), ICON_BUILDING, info)
}

/// Adds one random listing numbered after the markers already in `store`.
pub fn add_random<R: Rng + ?Sized>(store: &mut MarkerStore, center: LatLng, rng: &mut R) -> MarkerId {
    let n = store.len() + 1;
    store.add(random_listing(n, center, rng))
}

/// Fills `store` with `count` random listings around `center`.
pub fn seed<R: Rng + ?Sized>(store: &mut MarkerStore, center: LatLng, count: usize, rng: &mut R) {
    for _ in 0..count {
        add_random(store, center, rng);
    }
}

/// Cities the page offers as one-click jumps, each with a showcase listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Lille,
    Marseille,
    Paris,
}

impl Preset {
    pub fn center(&self) -> LatLng {
        match self {
            Preset::Lille => LatLng::new(50.62925, 3.057256),
            Preset::Marseille => LatLng::new(43.296482, 5.36978),
            Preset::Paris => LatLng::new(48.866667, 2.333333),
        }
    }

    pub fn listing(&self) -> Marker {
        // labels are padded so the text sits to the right of the icon
        let pad = "  ".repeat(4);
        let (icon, price_label, info) = match self {
            Preset::Lille => (
                ICON_HOUSE,
                "300€",
                listing_html(
                    "Maison 3 pièces 90m²",
                    "Lille 59000",
                    "900€/mois charges comprises",
                    "https://nsm09.casimages.com/img/2022/04/08//22040804151815960417859310.jpg",
                ),
            ),
            Preset::Marseille => (
                ICON_BUILDING,
                "675k",
                listing_html(
                    "Appartement 3 pièces 50m²",
                    "Marseille",
                    "675.000€",
                    "https://nsm09.casimages.com/img/2022/04/01/22040104520915960417851182.jpg",
                ),
            ),
            Preset::Paris => (
                ICON_BUILDING,
                "1,3M€",
                listing_html(
                    "Appartement 5 pièces 70m²",
                    "Paris",
                    "1 300 000 €",
                    "https://nsm09.casimages.com/img/2022/04/08//22040804395115960417859322.jpg",
                ),
            ),
        };
        Marker::new(self.center(), format!("{}{}", pad, price_label), icon, info)
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lille" => Ok(Preset::Lille),
            "marseille" => Ok(Preset::Marseille),
            "paris" => Ok(Preset::Paris),
            other => Err(format!("Unknown city: {}", other)),
        }
    }
}
