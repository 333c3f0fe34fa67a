// src/store_tests.rs
//
// Testes contra um Postgres real (testcontainers): transações, travas e
// rollback. Precisam de Docker; rode com `cargo test -- --ignored`.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::{AppState, Settings},
    models::{
        auth::{RegisterUserPayload, Role, User},
        interaction::CreateInteractionPayload,
        kermesse::{Kermesse, KermessePayload},
        stand::{CreateStandPayload, Stand, StandKind, UpdateStandPayload},
        tombola::{CreateTombolaPayload, Tombola, TombolaStatus, UpdateTombolaPayload},
        user::{InviteChildPayload, PayChildPayload},
    },
    services::notification::tests::RecordingNotifier,
};

/// Sobe um Postgres 16, aplica as migrações e monta o estado da aplicação.
/// O container precisa continuar vivo enquanto o teste roda.
async fn setup() -> (ContainerAsync<Postgres>, AppState) {
    let container = Postgres::default()
        .with_tag("16")
        .start()
        .await
        .expect("Falha ao subir o container do Postgres");

    let host = container.get_host().await.expect("host do container");
    let port = container.get_host_port_ipv4(5432).await.expect("porta do container");
    let url = format!("postgres://postgres:postgres@{host}:{port}/postgres");

    let settings = Settings::from_lookup(move |key: &str| match key {
        "DATABASE_URL" => Some(url.clone()),
        "JWT_SECRET" => Some("segredo".to_string()),
        _ => None,
    })
    .expect("configuração de teste");

    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .connect(&settings.database_url)
        .await
        .expect("Falha ao conectar no Postgres");
    sqlx::migrate!().run(&pool).await.expect("Falha nas migrações");

    let state = AppState::build(pool, settings, Arc::new(RecordingNotifier::default()));
    (container, state)
}

struct Fair {
    organizer: User,
    holder: User,
    parent: User,
    kermesse: Kermesse,
}

async fn register(state: &AppState, role: Role) -> User {
    state
        .auth_service
        .register_user(&RegisterUserPayload {
            name: format!("{role:?}"),
            email: format!("{}@kermesse.test", Uuid::new_v4()),
            password: "segredo123".into(),
            role,
        })
        .await
        .expect("cadastro")
        .user
}

async fn fair(state: &AppState) -> Fair {
    let organizer = register(state, Role::Organizer).await;
    let holder = register(state, Role::StandHolder).await;
    let parent = register(state, Role::Parent).await;

    let kermesse = state
        .kermesse_service
        .create(
            &organizer.principal(),
            &KermessePayload { name: "Kermesse de Primavera".into(), description: None },
        )
        .await
        .expect("kermesse");

    Fair { organizer, holder, parent, kermesse }
}

/// Stand do responsável da feira, já associado à kermesse.
async fn stand(state: &AppState, fair: &Fair, kind: StandKind, price: i64, stock: i32) -> Stand {
    let stand = state
        .stand_service
        .create(
            &fair.holder.principal(),
            &CreateStandPayload { name: "Crepes".into(), description: None, kind, price, stock },
        )
        .await
        .expect("stand");

    state
        .kermesse_service
        .add_stand(&fair.organizer.principal(), fair.kermesse.id, stand.id)
        .await
        .expect("associação do stand");
    stand
}

/// Criança convidada pelo responsável da feira, membro da kermesse e com
/// `credit` transferido pelo responsável.
async fn child(state: &AppState, fair: &Fair, credit: i64) -> User {
    let child = state
        .user_service
        .invite_child(
            &fair.parent.principal(),
            &InviteChildPayload { name: "Léa".into(), email: format!("{}@kermesse.test", Uuid::new_v4()) },
        )
        .await
        .expect("convite");

    state
        .kermesse_service
        .add_member(&fair.organizer.principal(), fair.kermesse.id, child.id)
        .await
        .expect("membro");

    if credit > 0 {
        state.user_service.top_up(&fair.parent.principal(), credit).await.expect("recarga");
        state
            .user_service
            .pay_child(&fair.parent.principal(), &PayChildPayload { child_id: child.id, amount: credit })
            .await
            .expect("mesada");
    }
    child
}

async fn tombola(state: &AppState, fair: &Fair, price: i64) -> Tombola {
    state
        .tombola_service
        .create(
            &fair.organizer.principal(),
            &CreateTombolaPayload {
                kermesse_id: fair.kermesse.id,
                name: "Grande Sorteio".into(),
                price,
                gift: "Uma bicicleta".into(),
            },
        )
        .await
        .expect("tombola")
}

async fn credit(state: &AppState, id: Uuid) -> i64 {
    state.user_service.get(id).await.expect("usuário").credit
}

async fn stock(state: &AppState, id: Uuid) -> i32 {
    state.stand_service.get(id).await.expect("stand").stock
}

async fn count(state: &AppState, sql: &str, id: Uuid) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(&state.db_pool)
        .await
        .expect("contagem")
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn rejected_purchase_leaves_balances_and_stock_untouched() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let crepes = stand(&state, &fair, StandKind::Consumption, 10, 5).await;
    let lea = child(&state, &fair, 15).await;

    let err = state
        .interaction_service
        .create(&lea.principal(), &CreateInteractionPayload { stand_id: crepes.id, quantity: Some(2) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotEnoughCredit), "{err:?}");

    assert_eq!(credit(&state, lea.id).await, 15);
    assert_eq!(credit(&state, fair.holder.id).await, 0);
    assert_eq!(stock(&state, crepes.id).await, 5);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM interactions WHERE user_id = $1", lea.id).await, 0);

    // A compra que cabe no saldo move exatamente o total entre as contas
    let bought = state
        .interaction_service
        .create(&lea.principal(), &CreateInteractionPayload { stand_id: crepes.id, quantity: Some(1) })
        .await
        .unwrap();
    assert_eq!(bought.credit, 10);
    assert_eq!(credit(&state, lea.id).await, 5);
    assert_eq!(credit(&state, fair.holder.id).await, 10);
    assert_eq!(stock(&state, crepes.id).await, 4);
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn last_unit_is_sold_only_once() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let crepes = stand(&state, &fair, StandKind::Consumption, 10, 1).await;
    let lea = child(&state, &fair, 10).await;
    let tom = child(&state, &fair, 10).await;

    let payload = CreateInteractionPayload { stand_id: crepes.id, quantity: Some(1) };
    let (lea_p, tom_p) = (lea.principal(), tom.principal());
    let (first, second) = tokio::join!(
        state.interaction_service.create(&lea_p, &payload),
        state.interaction_service.create(&tom_p, &payload),
    );

    let (sold, refused): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(|r| r.is_ok());
    assert_eq!(sold.len(), 1);
    assert!(matches!(refused[0], Err(AppError::NotEnoughStock)), "{:?}", refused[0]);

    assert_eq!(stock(&state, crepes.id).await, 0);
    assert_eq!(credit(&state, fair.holder.id).await, 10);
    assert_eq!(credit(&state, lea.id).await + credit(&state, tom.id).await, 10);
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn concurrent_finish_draws_a_single_winner() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let raffle = tombola(&state, &fair, 5).await;
    let lea = child(&state, &fair, 5).await;
    let tom = child(&state, &fair, 5).await;

    let mut sold = Vec::new();
    for buyer in [&lea, &tom] {
        let ticket = state.tombola_service.sell_ticket(&buyer.principal(), raffle.id).await.unwrap();
        sold.push(ticket.id);
    }
    assert_eq!(credit(&state, lea.id).await, 0);
    assert_eq!(credit(&state, tom.id).await, 0);

    let organizer = fair.organizer.principal();
    let (first, second) = tokio::join!(
        state.tombola_service.finish(&organizer, raffle.id),
        state.tombola_service.finish(&organizer, raffle.id),
    );

    let (finished, refused): (Vec<_>, Vec<_>) = [first, second].into_iter().partition(|r| r.is_ok());
    assert_eq!(finished.len(), 1);
    assert!(matches!(refused[0], Err(AppError::TombolaNotStarted)), "{:?}", refused[0]);

    let finished = finished.into_iter().next().unwrap().unwrap();
    assert_eq!(finished.tombola.status, TombolaStatus::Ended);
    let winner = finished.winner.expect("houve venda, houve ganhador");
    assert!(sold.contains(&winner.id));
    assert_eq!(
        count(&state, "SELECT COUNT(*) FROM tickets WHERE tombola_id = $1 AND is_winner", raffle.id).await,
        1
    );

    // Tombola encerrada não vende mais
    let err = state.tombola_service.sell_ticket(&lea.principal(), raffle.id).await.unwrap_err();
    assert!(matches!(err, AppError::TombolaNotStarted), "{err:?}");
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn raffle_without_tickets_ends_without_winner_and_frees_the_kermesse() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let raffle = tombola(&state, &fair, 5).await;
    let organizer = fair.organizer.principal();

    let err = state.kermesse_service.end(&organizer, fair.kermesse.id).await.unwrap_err();
    assert!(matches!(err, AppError::KermesseHasOpenTombola), "{err:?}");

    let finished = state.tombola_service.finish(&organizer, raffle.id).await.unwrap();
    assert!(finished.winner.is_none());

    let ended = state.kermesse_service.end(&organizer, fair.kermesse.id).await.unwrap();
    assert_eq!(ended.status, crate::models::kermesse::KermesseStatus::Ended);
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn inviting_a_child_brings_the_parent_along() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let members = "SELECT COUNT(*) FROM kermesses_users WHERE kermesse_id = $1";

    // Criança com responsável: duas linhas
    let lea = child(&state, &fair, 0).await;
    assert_eq!(count(&state, members, fair.kermesse.id).await, 2);
    assert_eq!(count(&state, "SELECT COUNT(*) FROM kermesses_users WHERE user_id = $1", lea.id).await, 1);
    assert_eq!(
        count(&state, "SELECT COUNT(*) FROM kermesses_users WHERE user_id = $1", fair.parent.id).await,
        1
    );

    // Criança sem responsável: uma linha
    let orphan: Uuid = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, role) VALUES ('Tom', $1, '', 'CHILD') RETURNING id",
    )
    .bind(format!("{}@kermesse.test", Uuid::new_v4()))
    .fetch_one(&state.db_pool)
    .await
    .unwrap();
    state
        .kermesse_service
        .add_member(&fair.organizer.principal(), fair.kermesse.id, orphan)
        .await
        .unwrap();
    assert_eq!(count(&state, members, fair.kermesse.id).await, 3);

    // Só crianças são convidadas
    let err = state
        .kermesse_service
        .add_member(&fair.organizer.principal(), fair.kermesse.id, fair.parent.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotChild), "{err:?}");
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn stock_edit_by_the_holder_lands_on_the_requested_value() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let crepes = stand(&state, &fair, StandKind::Consumption, 10, 3).await;
    let lea = child(&state, &fair, 10).await;

    state
        .interaction_service
        .create(&lea.principal(), &CreateInteractionPayload { stand_id: crepes.id, quantity: Some(1) })
        .await
        .unwrap();

    let updated = state
        .stand_service
        .update_current(
            &fair.holder.principal(),
            &UpdateStandPayload { name: "Crepes doces".into(), description: None, price: 12, stock: 50 },
        )
        .await
        .unwrap();
    assert_eq!(updated.stock, 50);
    assert_eq!(updated.price, 12);
    assert_eq!(stock(&state, crepes.id).await, 50);
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn raffle_income_keeps_the_price_charged_at_sale() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let raffle = tombola(&state, &fair, 5).await;
    let lea = child(&state, &fair, 5).await;

    let ticket = state.tombola_service.sell_ticket(&lea.principal(), raffle.id).await.unwrap();
    assert_eq!(ticket.price, 5);

    state
        .tombola_service
        .update(
            &fair.organizer.principal(),
            raffle.id,
            &UpdateTombolaPayload { name: "Grande Sorteio".into(), price: 9, gift: "Uma bicicleta".into() },
        )
        .await
        .unwrap();

    let details = state
        .kermesse_service
        .get(&fair.organizer.principal(), fair.kermesse.id)
        .await
        .unwrap();
    assert_eq!(details.stats.tombola_income, 5);
}

#[tokio::test]
#[ignore = "requer Docker"]
async fn kermesse_details_stay_within_the_caller_scope() {
    let (_container, state) = setup().await;
    let fair = fair(&state).await;
    let lea = child(&state, &fair, 0).await;
    let stranger = register(&state, Role::Organizer).await;

    let err = state
        .kermesse_service
        .get(&stranger.principal(), fair.kermesse.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = state
        .kermesse_service
        .list_invitable(&stranger.principal(), fair.kermesse.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    // Membro e organizador enxergam
    assert!(state.kermesse_service.get(&lea.principal(), fair.kermesse.id).await.is_ok());
    assert!(state
        .kermesse_service
        .list_invitable(&fair.organizer.principal(), fair.kermesse.id)
        .await
        .is_ok());
}
