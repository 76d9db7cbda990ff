use apihub::{
    db::catalog::{DETAIL_REVIEW_LIMIT, FEATURED_LIMIT},
    domain::{
        catalog::{ApiListQuery, NewApiListing},
        page::PageRequest,
        review::NewReview,
    },
    ApiHubError,
};

use crate::helpers::{create_test_api, create_test_user, initialize_test_db};

#[tokio::test]
async fn list_pages_cover_every_listing_once() {
    let db = initialize_test_db().await;
    for name in ["Alpha", "Bravo", "Charlie", "Delta", "Echo"] {
        create_test_api(&db, name, "Testing").await;
    }
    let query = ApiListQuery::default();
    let full = db.list_apis(&query, &PageRequest::new(100)).await.unwrap();
    assert_eq!(full.items.len(), 5);

    let first = db.list_apis(&query, &PageRequest::new(2)).await.unwrap();
    let cursor = first.next_cursor.clone().unwrap();
    let second = db
        .list_apis(&query, &PageRequest::after(2, cursor.clone()))
        .await
        .unwrap();
    assert_eq!(second.items[0].api.id, cursor);
    let third = db
        .list_apis(&query, &PageRequest::after(2, second.next_cursor.clone().unwrap()))
        .await
        .unwrap();
    assert_eq!(third.items.len(), 1);
    assert!(third.next_cursor.is_none());

    let paged: Vec<String> = [first, second, third]
        .iter()
        .flat_map(|p| p.items.iter().map(|a| a.api.id.clone()))
        .collect();
    let expected: Vec<String> = full.items.iter().map(|a| a.api.id.clone()).collect();
    assert_eq!(paged, expected);
}

#[tokio::test]
async fn exact_fit_page_has_no_cursor() {
    let db = initialize_test_db().await;
    for name in ["One", "Two"] {
        create_test_api(&db, name, "Testing").await;
    }
    let page = db
        .list_apis(&ApiListQuery::default(), &PageRequest::new(2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn filters_by_category_and_search() {
    let db = initialize_test_db().await;
    create_test_api(&db, "Cat Facts", "Animals").await;
    create_test_api(&db, "Dog CEO", "Animals").await;
    create_test_api(&db, "SpaceX", "Science").await;

    let animals = db
        .list_apis(
            &ApiListQuery {
                category: Some("Animals".into()),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(animals.items.len(), 2);

    let found = db
        .list_apis(
            &ApiListQuery {
                search: Some("sPaCe".into()),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].api.name, "SpaceX");

    // matches the description too
    let by_description = db
        .list_apis(
            &ApiListQuery {
                search: Some("ceo description".into()),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_description.items.len(), 1);

    // blank filters are ignored
    let all = db
        .list_apis(
            &ApiListQuery {
                category: Some(" ".into()),
                search: Some("".into()),
                ..Default::default()
            },
            &PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(all.items.len(), 3);
}

#[tokio::test]
async fn cursor_from_another_category_gives_an_empty_page() {
    let db = initialize_test_db().await;
    create_test_api(&db, "Cat Facts", "Animals").await;
    create_test_api(&db, "Dog CEO", "Animals").await;
    let foreign = create_test_api(&db, "SpaceX", "Science").await;

    let page = db
        .list_apis(
            &ApiListQuery {
                category: Some("Animals".into()),
                ..Default::default()
            },
            &PageRequest::after(10, foreign.id),
        )
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn averages_are_rounded_to_one_decimal() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "rater@example.com").await;
    let rated = create_test_api(&db, "Rated", "Testing").await;
    let unrated = create_test_api(&db, "Unrated", "Testing").await;
    for rating in [5, 4, 4] {
        db.create_review(NewReview {
            api_id: rated.id.clone(),
            user_id: user.id.clone(),
            rating,
            content: None,
        })
        .await
        .unwrap();
    }

    let page = db
        .list_apis(&ApiListQuery::default(), &PageRequest::default())
        .await
        .unwrap();
    let rated_row = page.items.iter().find(|a| a.api.id == rated.id).unwrap();
    assert_eq!(rated_row.avg_rating, 4.3);
    assert_eq!(rated_row.review_count, 3);
    let unrated_row = page.items.iter().find(|a| a.api.id == unrated.id).unwrap();
    assert_eq!(unrated_row.avg_rating, 0.0);
    assert_eq!(unrated_row.review_count, 0);
}

#[tokio::test]
async fn detail_averages_all_reviews_but_lists_recent_ones() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "busy@example.com").await;
    let api = create_test_api(&db, "Popular", "Testing").await;
    for i in 0..12 {
        db.create_review(NewReview {
            api_id: api.id.clone(),
            user_id: user.id.clone(),
            rating: if i < 6 { 5 } else { 4 },
            content: Some(format!("review {}", i)),
        })
        .await
        .unwrap();
    }

    let detail = db.get_api(&api.id).await.unwrap();
    assert_eq!(detail.api.review_count, 12);
    assert_eq!(detail.api.avg_rating, 4.5);
    assert_eq!(detail.reviews.len() as i64, DETAIL_REVIEW_LIMIT);
    assert!(detail
        .reviews
        .windows(2)
        .all(|w| w[0].review.created_at >= w[1].review.created_at));
    assert_eq!(detail.reviews[0].user.id, user.id);
}

#[tokio::test]
async fn unknown_api_is_not_found() {
    let db = initialize_test_db().await;
    let err = db.get_api("nope").await.unwrap_err();
    assert!(matches!(err, ApiHubError::NotFound(_)));
}

#[tokio::test]
async fn listing_needs_name_and_base_url() {
    let db = initialize_test_db().await;
    let err = db
        .create_api(NewApiListing {
            name: "Nameless".into(),
            base_url: "".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiHubError::Validation(_)));
}

#[tokio::test]
async fn categories_are_counted() {
    let db = initialize_test_db().await;
    create_test_api(&db, "Cat Facts", "Animals").await;
    create_test_api(&db, "Dog CEO", "Animals").await;
    create_test_api(&db, "SpaceX", "Science").await;

    let categories = db.list_categories().await.unwrap();
    let pairs: Vec<(&str, i64)> = categories
        .iter()
        .map(|c| (c.name.as_str(), c.count))
        .collect();
    assert_eq!(pairs, vec![("Animals", 2), ("Science", 1)]);
}

#[tokio::test]
async fn featured_is_capped_and_excludes_others() {
    let db = initialize_test_db().await;
    for i in 0..8 {
        db.create_api(NewApiListing {
            name: format!("Featured {}", i),
            base_url: "https://featured.example.com".into(),
            featured: true,
            ..Default::default()
        })
        .await
        .unwrap();
    }
    create_test_api(&db, "Plain", "Testing").await;

    let featured = db.list_featured().await.unwrap();
    assert_eq!(featured.len() as i64, FEATURED_LIMIT);
    assert!(featured.iter().all(|a| a.api.featured));
}

#[tokio::test]
async fn seed_loads_demo_catalog() {
    let db = initialize_test_db().await;
    create_test_api(&db, "Leftover", "Testing").await;

    let summary = db.seed().await.unwrap();
    // running it twice starts from scratch again
    let again = db.seed().await.unwrap();
    assert_eq!(summary, again);

    let page = db
        .list_apis(&ApiListQuery::default(), &PageRequest::new(100))
        .await
        .unwrap();
    assert_eq!(page.items.len(), summary.apis);
    assert!(page.items.iter().all(|a| a.api.name != "Leftover"));
    let reviewed: i64 = page.items.iter().map(|a| a.review_count).sum();
    assert_eq!(reviewed as usize, summary.reviews);
}
