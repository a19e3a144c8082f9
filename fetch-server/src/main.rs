use axum::{
    routing,
    Router,
    middleware as axum_middleware,
};
use tower::ServiceBuilder;

#[tokio::main]
async fn main() -> Result<(), common_types_tickets::E> {
    tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .init();

    let appstate = common_types_tickets::State::make_state().await?;
    let router = Router::new()
                    .route("/submit-ticket", routing::post(common_types_tickets::Routes::submit_ticket::request))
                    .route("/ticket", routing::get(common_types_tickets::Routes::get_ticket::request))
                    .route("/ticket/status", routing::put(common_types_tickets::Routes::update_ticket::request))
                    .route("/ticket/close", routing::put(common_types_tickets::Routes::close_ticket::request))
                    .route("/ticket/comment", routing::post(common_types_tickets::Routes::comment::request))
                    .route("/tickets", routing::get(common_types_tickets::Routes::list_ticket::request))
                    .route("/tickets/stats", routing::get(common_types_tickets::Routes::stats::request))
                    .route("/survey", routing::post(common_types_tickets::Routes::survey::request))
                    .route_layer(ServiceBuilder::new()
                                 .layer(axum_middleware::from_fn(common_types_tickets::Middleware::actor::middleware))
                              )
                    .route_layer(axum_middleware::from_fn(common_types_tickets::Middleware::set_cors_headers::middleware))
                    .with_state(appstate);

    let bind_addr: ::std::net::SocketAddr = common_types_tickets::Constants::SERVER_BIND_ADDR.parse()?;
    tracing::info!("Listening on {bind_addr}");
    axum::Server::bind(&bind_addr)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
