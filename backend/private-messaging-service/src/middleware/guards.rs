//! Typed extractors for the authenticated caller. Handlers that take one of
//! these cannot run without the identity set by [`JwtAuth`](super::auth::JwtAuth).

use super::auth::AuthenticatedUser;
use crate::error::AppError;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, Ready};

#[derive(Debug, Clone, Copy)]
pub struct User {
    pub id: i64,
}

impl FromRequest for User {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied();
        ready(
            user.map(|u| User { id: u.id })
                .ok_or_else(|| AppError::Unauthorized.into()),
        )
    }
}

/// Caller holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub id: i64,
}

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().copied();
        let result = match user {
            None => Err(AppError::Unauthorized),
            Some(u) if !u.is_admin => Err(AppError::AdminRequired),
            Some(u) => Ok(AdminUser { id: u.id }),
        };
        ready(result.map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn user_requires_authenticated_identity() {
        let req = TestRequest::default().to_http_request();
        assert!(User::extract(&req).await.is_err());

        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUser {
            id: 9,
            is_admin: false,
        });
        assert_eq!(User::extract(&req).await.unwrap().id, 9);
    }

    #[actix_web::test]
    async fn admin_guard_rejects_regular_users() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUser {
            id: 9,
            is_admin: false,
        });
        let err = AdminUser::extract(&req).await.unwrap_err();
        assert_eq!(err.as_response_error().status_code().as_u16(), 403);

        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUser {
            id: 1,
            is_admin: true,
        });
        assert_eq!(AdminUser::extract(&req).await.unwrap().id, 1);
    }
}
