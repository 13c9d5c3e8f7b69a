//! `declare_api!`: name a client type and list its endpoints in one place.

/// Declare an API client type.
///
/// Each `name => verb "template"` line becomes a method taking `Args`. The
/// endpoint set is validated and built the first time it is needed, then
/// shared by every instance of the type.
///
/// ```
/// use devourer_core::{args, declare_api};
///
/// declare_api! {
///     /// JSON placeholder API.
///     pub struct PlaceholderApi {
///         posts => get "posts/",
///         post => get "posts/{id}/",
///         comments => get "posts/{id}/comments",
///         add_post => post "posts/",
///     }
/// }
///
/// # fn main() -> devourer_core::Result<()> {
/// let api = PlaceholderApi::builder("http://localhost:3000/")?
///     .load_json(true)
///     .throw_on_error(true)
///     .build()
///     .map(PlaceholderApi::from_client)?;
/// assert_eq!(api.client().endpoints().len(), 4);
/// # let _ = args! { "id" => 1 };
/// # Ok(())
/// # }
/// ```
///
/// Prefix the struct with `async` to back it with an `AsyncClient`. The same
/// declaration then yields, per endpoint, the blocking method and a
/// `<name>_async` method returning a `CallHandle`.
///
/// Endpoint names share the type's namespace with the generated helpers
/// (`endpoints`, `builder`, `client`, `from_client`, and for the `async`
/// form `async_client` and `from_async_client`), so those names cannot be
/// used for endpoints:
///
/// ```compile_fail
/// devourer_core::declare_api! {
///     struct Clashing {
///         builder => get "builders/",
///     }
/// }
/// ```
#[macro_export]
macro_rules! declare_api {
    (@endpoints ($vis:vis) $( $method:ident => $verb:ident $template:literal ),*) => {
        /// Endpoints declared on this type.
        $vis fn endpoints() -> $crate::Result<::std::sync::Arc<$crate::EndpointSet>> {
            static ENDPOINTS: ::std::sync::OnceLock<::std::sync::Arc<$crate::EndpointSet>> =
                ::std::sync::OnceLock::new();
            if let Some(set) = ENDPOINTS.get() {
                return Ok(::std::sync::Arc::clone(set));
            }
            let set = $crate::EndpointSet::new()
                $( .declare(::std::stringify!($method), ::std::stringify!($verb), $template)? )*;
            Ok(::std::sync::Arc::clone(
                ENDPOINTS.get_or_init(|| ::std::sync::Arc::new(set)),
            ))
        }

        /// A client builder preloaded with this type's endpoints.
        $vis fn builder(
            base_url: impl Into<::std::string::String>,
        ) -> $crate::Result<$crate::ClientBuilder> {
            Ok($crate::Client::builder(base_url).endpoints(Self::endpoints()?))
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis async struct $name:ident {
            $( $(#[$method_meta:meta])* $method:ident => $verb:ident $template:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            inner: $crate::AsyncClient,
        }

        impl $name {
            $crate::declare_api!(@endpoints ($vis) $( $method => $verb $template ),*);

            $vis fn from_async_client(inner: $crate::AsyncClient) -> Self {
                Self { inner }
            }

            $vis fn async_client(&self) -> &$crate::AsyncClient {
                &self.inner
            }

            $vis fn client(&self) -> &$crate::Client {
                self.inner.client()
            }

            $(
                $(#[$method_meta])*
                $vis fn $method(
                    &self,
                    args: $crate::Args,
                ) -> $crate::Result<::std::option::Option<$crate::Response>> {
                    self.inner.client().call(::std::stringify!($method), args)
                }
            )*

            $crate::__private::paste::paste! {
                $(
                    $(#[$method_meta])*
                    $vis fn [<$method _async>](&self, args: $crate::Args) -> $crate::CallHandle {
                        self.inner.call(::std::stringify!($method), args)
                    }
                )*
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$method_meta:meta])* $method:ident => $verb:ident $template:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            inner: $crate::Client,
        }

        impl $name {
            $crate::declare_api!(@endpoints ($vis) $( $method => $verb $template ),*);

            $vis fn from_client(inner: $crate::Client) -> Self {
                Self { inner }
            }

            $vis fn client(&self) -> &$crate::Client {
                &self.inner
            }

            $(
                $(#[$method_meta])*
                $vis fn $method(
                    &self,
                    args: $crate::Args,
                ) -> $crate::Result<::std::option::Option<$crate::Response>> {
                    self.inner.call(::std::stringify!($method), args)
                }
            )*
        }
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::transport::mock::MockTransport;
    use crate::{args, AsyncClient, Error, Method, Response, TemplateError};

    crate::declare_api! {
        /// Placeholder API used by the tests below.
        struct TestApi {
            posts => get "posts/",
            /// A single post.
            post => get "posts/{id}/",
            add_post => post "posts/",
        }
    }

    crate::declare_api! {
        async struct TestAsyncApi {
            posts => get "posts/",
            comments => get "posts/{id}/comments",
        }
    }

    crate::declare_api! {
        struct BrokenApi {
            bad => get "posts/{data}",
        }
    }

    fn api(transport: &MockTransport) -> TestApi {
        TestApi::builder("http://localhost:3000/")
            .unwrap()
            .load_json(true)
            .throw_on_error(true)
            .transport(transport.clone())
            .build()
            .map(TestApi::from_client)
            .unwrap()
    }

    #[test]
    fn declared_endpoints_are_registered() {
        let endpoints = TestApi::endpoints().unwrap();
        assert_eq!(endpoints.names().collect::<Vec<_>>(), ["add_post", "post", "posts"]);
        assert_eq!(endpoints.lookup("add_post").unwrap().method(), Method::Post);
        assert!(std::sync::Arc::ptr_eq(&endpoints, &TestApi::endpoints().unwrap()));
    }

    #[test]
    fn generated_methods_dispatch_by_name() {
        let transport = MockTransport::replying(200, r#"{"id":1}"#);
        let api = api(&transport);
        let post = api.post(args! { "id" => 1 }).unwrap().unwrap();
        assert_eq!(post, Response::Json(json!({ "id": 1 })));
        api.add_post(args! { "payload" => json!({ "title": "t" }) }).unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://localhost:3000/posts/1/");
        assert_eq!(requests[1].method, Method::Post);
        assert_eq!(requests[1].body.as_deref(), Some(r#"{"title":"t"}"#));
    }

    #[test]
    fn generated_methods_check_placeholders() {
        let transport = MockTransport::replying(200, "{}");
        let err = api(&transport).post(args! {}).unwrap_err();
        assert!(matches!(err, Error::Template(TemplateError::MissingPlaceholder(_))));
    }

    #[test]
    fn async_declaration_has_blocking_and_handle_methods() {
        let transport = MockTransport::replying(200, "[]");
        let client = TestAsyncApi::builder("http://localhost:3000/")
            .unwrap()
            .load_json(true)
            .transport(transport.clone())
            .build()
            .unwrap();
        let api = TestAsyncApi::from_async_client(AsyncClient::new(client).unwrap());

        let handle = api.comments_async(args! { "id" => 3 });
        assert_eq!(handle.endpoint(), "comments");
        let deferred = handle.result().unwrap();
        let blocking = api.comments(args! { "id" => 3 }).unwrap();
        assert_eq!(deferred, blocking);
        assert_eq!(blocking, Some(Response::Json(json!([]))));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
        assert_eq!(requests[0].url, "http://localhost:3000/posts/3/comments");
        assert_eq!(api.async_client().workers(), 2);
        assert_eq!(api.client().endpoints().len(), 2);
    }

    #[test]
    fn invalid_declaration_fails_on_first_use() {
        let err = BrokenApi::builder("http://localhost:3000/").unwrap_err();
        assert!(matches!(err, Error::Template(TemplateError::ReservedPlaceholder(_))));
    }
}
