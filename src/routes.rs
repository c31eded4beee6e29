use crate::{
    api::{department, faculty, leave, leave_type},
    auth::handlers,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let signup_limiter = Arc::new(build_limiter(config.rate_signup_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Credential endpoints get the tightest limits
    cfg.service(
        web::resource("/signup")
            .wrap(signup_limiter)
            .route(web::post().to(handlers::signup)),
    )
    .service(
        web::resource("/login")
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::login)),
    )
    .service(
        web::resource("/forgot-password")
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::forgot_password)),
    )
    .service(
        web::resource("/reset-password/{token}")
            .wrap(login_limiter.clone())
            .route(web::post().to(handlers::reset_password)),
    )
    .service(
        web::resource("/logout")
            .wrap(login_limiter)
            .route(web::post().to(handlers::logout)),
    );

    // Public reads and the schedule proxy
    cfg.service(
        web::resource("/departments")
            .route(web::get().to(department::list_departments))
            .route(web::post().to(department::create_department)),
    )
    .service(
        web::resource("/departments/{id}")
            .route(web::put().to(department::update_department))
            .route(web::delete().to(department::delete_department)),
    )
    .service(
        web::resource("/leave-types")
            .route(web::get().to(leave_type::list_leave_types))
            .route(web::post().to(leave_type::create_leave_type)),
    )
    .service(
        web::resource("/leave-types/{id}")
            .route(web::put().to(leave_type::update_leave_type))
            .route(web::delete().to(leave_type::delete_leave_type)),
    )
    .service(web::resource("/faculty-load").route(web::get().to(faculty::faculty_load)));

    // Session-holder endpoints; admin checks happen inside the handlers
    cfg.service(
        web::scope("")
            .wrap(protected_limiter)
            .service(web::resource("/user").route(web::get().to(handlers::current_user)))
            .service(web::resource("/faculties").route(web::get().to(faculty::list_faculties)))
            .service(
                web::resource("/faculty/{id}").route(web::delete().to(faculty::delete_faculty)),
            )
            .service(
                web::scope("/leaves")
                    .service(web::resource("/apply").route(web::post().to(leave::apply_leave)))
                    .service(web::resource("/my").route(web::get().to(leave::my_leaves)))
                    .service(
                        web::resource("/my/counts").route(web::get().to(leave::my_leave_counts)),
                    )
                    .service(
                        web::resource("/notifications/pending")
                            .route(web::get().to(leave::pending_notifications)),
                    )
                    .service(
                        web::resource("/remaining/{type_id}")
                            .route(web::get().to(leave::remaining_balance)),
                    )
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::all_leaves)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(leave::set_leave_status)),
                    )
                    .service(
                        web::resource("/{id}/mark-notified")
                            .route(web::put().to(leave::mark_notified)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(leave::delete_leave)),
                    ),
            ),
    );
}
