use apihub::{
    domain::{
        page::PageRequest,
        review::{NewReview, ReviewSort, VoteDirection},
    },
    ApiHubDb, ApiHubError,
};

use crate::helpers::{create_test_api, create_test_user, initialize_test_db};

async fn review(db: &ApiHubDb, api_id: &str, user_id: &str, rating: i64) -> String {
    db.create_review(NewReview {
        api_id: api_id.to_string(),
        user_id: user_id.to_string(),
        rating,
        content: Some(format!("{} stars", rating)),
    })
    .await
    .unwrap()
    .review
    .id
}

#[tokio::test]
async fn new_review_starts_unvoted_with_author() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "author@example.com").await;
    let api = create_test_api(&db, "PokeAPI", "Gaming").await;

    let created = db
        .create_review(NewReview {
            api_id: api.id.clone(),
            user_id: user.id.clone(),
            rating: 4,
            content: Some("solid".into()),
        })
        .await
        .unwrap();

    assert_eq!(created.review.helpful_count, 0);
    assert_eq!(created.review.rating, 4);
    assert_eq!(created.user.id, user.id);
    assert_eq!(created.user.name, user.name);
}

#[tokio::test]
async fn rating_must_be_one_to_five() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "strict@example.com").await;
    let api = create_test_api(&db, "Numbers API", "Science").await;
    for rating in [0, 6] {
        let err = db
            .create_review(NewReview {
                api_id: api.id.clone(),
                user_id: user.id.clone(),
                rating,
                content: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiHubError::Validation(_)));
    }
}

#[tokio::test]
async fn sorts_by_rating_both_ways() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "sorter@example.com").await;
    let api = create_test_api(&db, "SpaceX", "Science").await;
    for rating in [3, 5, 1, 4, 2] {
        review(&db, &api.id, &user.id, rating).await;
    }

    let highest = db
        .list_reviews(&api.id, ReviewSort::Highest, &PageRequest::default())
        .await
        .unwrap();
    let ratings: Vec<i64> = highest.items.iter().map(|r| r.review.rating).collect();
    assert_eq!(ratings, vec![5, 4, 3, 2, 1]);

    let lowest = db
        .list_reviews(&api.id, ReviewSort::Lowest, &PageRequest::default())
        .await
        .unwrap();
    let ratings: Vec<i64> = lowest.items.iter().map(|r| r.review.rating).collect();
    assert_eq!(ratings, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn rating_pages_walk_through_ties() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "ties@example.com").await;
    let api = create_test_api(&db, "Rick and Morty", "Entertainment").await;
    for rating in [5, 5, 5, 4, 4] {
        review(&db, &api.id, &user.id, rating).await;
    }

    let full = db
        .list_reviews(&api.id, ReviewSort::Highest, &PageRequest::new(50))
        .await
        .unwrap();
    let mut seen = Vec::new();
    let mut request = PageRequest::new(2);
    loop {
        let page = db
            .list_reviews(&api.id, ReviewSort::Highest, &request)
            .await
            .unwrap();
        seen.extend(page.items.iter().map(|r| r.review.id.clone()));
        match page.next_cursor {
            Some(cursor) => request = PageRequest::after(2, cursor),
            None => break,
        }
    }
    let expected: Vec<String> = full.items.iter().map(|r| r.review.id.clone()).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn reviews_are_scoped_to_their_api() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "scoped@example.com").await;
    let first = create_test_api(&db, "First", "Testing").await;
    let second = create_test_api(&db, "Second", "Testing").await;
    review(&db, &first.id, &user.id, 5).await;
    review(&db, &second.id, &user.id, 2).await;

    let page = db
        .list_reviews(&first.id, ReviewSort::Recent, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].review.api_id, first.id);
}

#[tokio::test]
async fn cursor_from_another_api_gives_an_empty_page() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "cross@example.com").await;
    let first = create_test_api(&db, "First", "Testing").await;
    let second = create_test_api(&db, "Second", "Testing").await;
    for rating in [3, 4, 5] {
        review(&db, &first.id, &user.id, rating).await;
    }
    let foreign = review(&db, &second.id, &user.id, 1).await;

    for sort in [ReviewSort::Recent, ReviewSort::Highest, ReviewSort::Lowest] {
        let page = db
            .list_reviews(&first.id, sort, &PageRequest::after(10, foreign.clone()))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }
}

#[tokio::test]
async fn votes_move_helpful_count_without_a_floor() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "voter@example.com").await;
    let api = create_test_api(&db, "Dog CEO", "Animals").await;
    let id = review(&db, &api.id, &user.id, 3).await;

    let voted = db.vote_review(&id, VoteDirection::Up).await.unwrap();
    assert_eq!(voted.helpful_count, 1);
    db.vote_review(&id, VoteDirection::Down).await.unwrap();
    let voted = db.vote_review(&id, VoteDirection::Down).await.unwrap();
    assert_eq!(voted.helpful_count, -1);
}

#[tokio::test]
async fn voting_on_missing_review_is_not_found() {
    let db = initialize_test_db().await;
    let err = db.vote_review("nope", VoteDirection::Up).await.unwrap_err();
    assert!(matches!(err, ApiHubError::NotFound(_)));
}

#[tokio::test]
async fn deleting_api_removes_its_reviews() {
    let db = initialize_test_db().await;
    let user = create_test_user(&db, "cascade@example.com").await;
    let api = create_test_api(&db, "Gone", "Testing").await;
    let id = review(&db, &api.id, &user.id, 4).await;

    db.delete_api(&api.id).await.unwrap();
    let err = db.get_review(&id).await.unwrap_err();
    assert!(matches!(err, ApiHubError::NotFound(_)));
}
