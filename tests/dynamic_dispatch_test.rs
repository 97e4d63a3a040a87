use asb_portal::domain::content::{Club, ClubDraft};
use asb_portal::domain::ports::RepositoryRef;
use asb_portal::domain::product::{Product, ProductDraft};
use asb_portal::domain::record::Editable;
use asb_portal::infrastructure::in_memory;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_repositories_as_trait_objects() {
    let stores = in_memory::stores();
    let products: RepositoryRef<Product> = stores.products.clone();
    let clubs: RepositoryRef<Club> = stores.clubs.clone();

    let product = Product::create(ProductDraft {
        name: "Yearbook".to_string(),
        description: String::new(),
        price: dec!(60.00).try_into().unwrap(),
        stock: 100,
        category: None,
        image_id: None,
        active: true,
    })
    .unwrap();
    let club = Club::create(ClubDraft {
        name: "Robotics".to_string(),
        description: String::new(),
        advisor: None,
        meeting_time: Some("Thursdays 3pm".to_string()),
        contact_email: None,
        image_id: None,
    })
    .unwrap();
    let (product_id, club_id) = (product.id.clone(), club.id.clone());

    // Verify Send + Sync by spawning tasks
    let product_handle = tokio::spawn(async move {
        products.store(product).await.unwrap();
        products.get(&product_id).await.unwrap().unwrap()
    });

    let club_handle = tokio::spawn(async move {
        clubs.store(club).await.unwrap();
        clubs.get(&club_id).await.unwrap().unwrap()
    });

    let retrieved_product = product_handle.await.unwrap();
    assert_eq!(retrieved_product.name, "Yearbook");

    let retrieved_club = club_handle.await.unwrap();
    assert_eq!(retrieved_club.meeting_time.as_deref(), Some("Thursdays 3pm"));

    // The shared `Stores` sees what the tasks wrote.
    assert_eq!(stores.products.get_all().await.unwrap().len(), 1);
    assert_eq!(stores.clubs.get_all().await.unwrap().len(), 1);
}
