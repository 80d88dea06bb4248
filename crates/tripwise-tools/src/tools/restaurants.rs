use async_trait::async_trait;
use tripwise_core::error::Result;
use tripwise_core::tool::{Tool, ToolDefinition, required_str};

type Listing = ((&'static str, &'static str), [&'static str; 3]);

const LISTINGS: [Listing; 8] = [
    (
        ("madrid", "italian"),
        [
            "Trattoria Malatesta - Calle Lope de Vega 9 ★★★★☆",
            "Gioia Madrid - Calle de San Bartolomé 23 ★★★★★",
            "Cinquecento - Calle de Recoletos 6 ★★★★☆",
        ],
    ),
    (
        ("madrid", "spanish"),
        [
            "Botín - Calle de Cuchilleros 17 ★★★★★ (world's oldest restaurant)",
            "Casa Lucio - Calle de la Cava Baja 35 ★★★★☆",
            "StreetXO - Calle de Serrano 52 ★★★★☆",
        ],
    ),
    (
        ("tokyo", "japanese"),
        [
            "Sukiyabashi Jiro - Ginza ★★★★★",
            "Ichiran Ramen - Shibuya ★★★★☆",
            "Tsukiji Tamasuji - Tsukiji ★★★★★",
        ],
    ),
    (
        ("tokyo", "ramen"),
        [
            "Fuunji - Shinjuku ★★★★★",
            "Afuri - Ebisu ★★★★☆",
            "Ichiran - Multiple locations ★★★★☆",
        ],
    ),
    (
        ("paris", "french"),
        [
            "Le Comptoir du Panthéon - Rue Soufflot ★★★★☆",
            "Chez Janou - Rue Roger Verlomme ★★★★★",
            "Le Bouillon Chartier - Rue du Faubourg Montmartre ★★★★☆",
        ],
    ),
    (
        ("barcelona", "spanish"),
        [
            "Cal Pep - Plaça de les Olles ★★★★★",
            "Tickets - Avinguda del Paral·lel ★★★★★",
            "Els Quatre Gats - Carrer de Montsió ★★★★☆",
        ],
    ),
    (
        ("seattle", "japanese"),
        [
            "Shiro's Sushi - 2401 2nd Ave ★★★★★",
            "Jiro Sushi - 1011 Pike St ★★★★☆",
            "Kamonegi - 1054 N 39th St ★★★★★",
        ],
    ),
    (
        ("amsterdam", "dutch"),
        [
            "De Silveren Spiegel - Kattengat 4-6 ★★★★★",
            "Moeders - Rozengracht 251 ★★★★☆",
            "Haesje Claes - Spuistraat 275 ★★★★☆",
        ],
    ),
];

/// Restaurant search by city and cuisine.
pub struct RestaurantTool;

pub fn search_restaurants(city: &str, cuisine: &str) -> String {
    let key = (city.trim().to_lowercase(), cuisine.trim().to_lowercase());
    let found = LISTINGS
        .iter()
        .find(|((c, k), _)| *c == key.0 && *k == key.1);

    match found {
        Some((_, entries)) => {
            let lines: Vec<String> = entries.iter().map(|e| format!("  • {e}")).collect();
            format!("Restaurants in {city} ({cuisine} cuisine):\n{}", lines.join("\n"))
        }
        None => format!(
            "Found some {cuisine} restaurants in {city}:\n  \
             • The {cuisine} Kitchen - Downtown ★★★★☆\n  \
             • Casa {cuisine} - Old Town ★★★☆☆\n  \
             • {cuisine} Bistro - Riverside ★★★★★"
        ),
    }
}

#[async_trait]
impl Tool for RestaurantTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_restaurants".into(),
            description: "Search for restaurants in a given city by cuisine type.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "The city to search restaurants in"
                    },
                    "cuisine": {
                        "type": "string",
                        "description": "Type of cuisine, e.g. 'Italian', 'Japanese', 'Mexican'"
                    }
                },
                "required": ["city", "cuisine"]
            }),
        }
    }

    async fn call(&self, input: serde_json::Value) -> Result<String> {
        let city = required_str(&input, "city")?;
        let cuisine = required_str(&input, "cuisine")?;
        Ok(search_restaurants(city, cuisine))
    }
}
