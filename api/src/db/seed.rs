use tracing::info;

use super::ApiHubDb;
use crate::{
    domain::{catalog::NewApiListing, review::NewReview, user::NewUser},
    error::Result,
};

pub const DEMO_USER_EMAIL: &str = "demo@apihub.dev";
const SAMPLE_REVIEW: &str = "Great API for testing! Works perfectly for my projects.";

struct SampleApi {
    name: &'static str,
    description: &'static str,
    base_url: &'static str,
    category: &'static str,
    auth_type: &'static str,
    rate_limit: &'static str,
    cors: &'static str,
    https: bool,
    featured: bool,
}

const SAMPLE_APIS: &[SampleApi] = &[
    SampleApi {
        name: "JSONPlaceholder",
        description: "Fake Online REST API for testing and prototyping.",
        base_url: "https://jsonplaceholder.typicode.com",
        category: "Development",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Unknown",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "Cat Facts",
        description: "Random cat facts to display on your website or app.",
        base_url: "https://catfact.ninja",
        category: "Animals",
        auth_type: "Api Key",
        rate_limit: "500/day",
        cors: "Unknown",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "PokeAPI",
        description: "RESTful Pokemon API. All the Pokemon data you'll ever need in one place.",
        base_url: "https://pokeapi.co/api/v2",
        category: "Gaming",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Yes",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "Rick and Morty",
        description: "Characters, locations and episodes of the show.",
        base_url: "https://rickandmortyapi.com/api",
        category: "Entertainment",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Yes",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "Random User Generator",
        description: "Random user data with names, photos, and addresses.",
        base_url: "https://randomuser.me/api",
        category: "Testing",
        auth_type: "None",
        rate_limit: "1000/day",
        cors: "Unknown",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "Numbers API",
        description: "Facts about numbers, math, dates, and years.",
        base_url: "http://numbersapi.com",
        category: "Science",
        auth_type: "None",
        rate_limit: "100/hour",
        cors: "Unknown",
        https: false,
        featured: false,
    },
    SampleApi {
        name: "Dog CEO",
        description: "Random dog images from the Dog CEO database.",
        base_url: "https://dog.ceo/api",
        category: "Animals",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Yes",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "Open Trivia Database",
        description: "Random trivia questions from various categories.",
        base_url: "https://opentdb.com/api.php",
        category: "Education",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Unknown",
        https: true,
        featured: false,
    },
    SampleApi {
        name: "SpaceX",
        description: "Data about SpaceX launches, rockets, and more.",
        base_url: "https://api.spacexdata.com/v4",
        category: "Science",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Yes",
        https: true,
        featured: true,
    },
    SampleApi {
        name: "Zippopotam.us",
        description: "Convert zip codes to location data.",
        base_url: "https://api.zippopotam.us",
        category: "Geocoding",
        auth_type: "None",
        rate_limit: "Unlimited",
        cors: "Unknown",
        https: true,
        featured: false,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub apis: usize,
    pub reviews: usize,
}

impl ApiHubDb {
    /// Wipes users, listings, reviews and history, then loads the demo catalog.
    pub async fn seed(&self) -> Result<SeedSummary> {
        info!("seeding database");
        let mut transaction = self.pool.begin().await?;
        for table in ["reviews", "request_history", "apis", "users"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *transaction)
                .await?;
        }
        transaction.commit().await?;

        let user = self
            .create_user(NewUser {
                email: DEMO_USER_EMAIL.to_string(),
                name: Some("Demo User".to_string()),
                avatar_url: None,
            })
            .await?;

        let mut reviews = 0;
        for (index, sample) in SAMPLE_APIS.iter().enumerate() {
            let api = self
                .create_api(NewApiListing {
                    name: sample.name.to_string(),
                    description: Some(sample.description.to_string()),
                    base_url: sample.base_url.to_string(),
                    category: Some(sample.category.to_string()),
                    auth_type: Some(sample.auth_type.to_string()),
                    rate_limit: Some(sample.rate_limit.to_string()),
                    https: sample.https,
                    cors: Some(sample.cors.to_string()),
                    documentation_url: None,
                    featured: sample.featured,
                })
                .await?;

            if index % 2 == 0 {
                self
                    .create_review(NewReview {
                        api_id: api.id,
                        user_id: user.id.clone(),
                        rating: 3 + (index as i64 % 3),
                        content: Some(SAMPLE_REVIEW.to_string()),
                    })
                    .await?;
                reviews += 1;
            }
        }

        info!("seeded {} apis and {} reviews", SAMPLE_APIS.len(), reviews);
        Ok(SeedSummary {
            apis: SAMPLE_APIS.len(),
            reviews,
        })
    }
}
