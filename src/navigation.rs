//! This file defines the templates and a convenience function for creating the navigation bar.

use maud::{Markup, html};

use crate::{auth::Identity, endpoints};

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

/// The navigation bar with the signed in user's name and avatar.
pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
    identity: &'a Identity,
}

impl<'a> NavBar<'a> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str, identity: &'a Identity) -> NavBar<'a> {
        let links = vec![
            Link {
                url: endpoints::DASHBOARD_VIEW,
                title: "Dashboard",
                is_current: active_endpoint == endpoints::DASHBOARD_VIEW,
            },
            Link {
                url: endpoints::SIGN_OUT,
                title: "Sign out",
                is_current: false,
            },
        ];

        NavBar { links, identity }
    }

    /// Render the navigation bar.
    pub fn into_html(self) -> Markup {
        let identity = self.identity;
        let initial = identity
            .display_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default();

        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::DASHBOARD_VIEW)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Finance Tracker"
                        }
                    }

                    div class="flex items-center gap-6"
                    {
                        ul
                            class="font-medium flex flex-row space-x-4 lg:space-x-8
                            rtl:space-x-reverse dark:bg-gray-900"
                        {
                            @for link in self.links {
                                li { (link.into_html()) }
                            }
                        }

                        div
                            class="flex items-center gap-2 text-sm text-gray-700 dark:text-gray-300"
                            data-user-id=(identity.id.as_str())
                        {
                            @if let Some(avatar_url) = &identity.avatar_url {
                                img
                                    src=(avatar_url)
                                    alt=(format!("{}'s avatar", identity.display_name))
                                    class="w-8 h-8 rounded-full";
                            } @else {
                                span
                                    class="flex items-center justify-center w-8 h-8
                                    rounded-full bg-blue-100 text-blue-700 font-semibold
                                    dark:bg-blue-900 dark:text-blue-200"
                                    aria-hidden="true"
                                {
                                    (initial)
                                }
                            }

                            span class="hidden sm:inline" { (identity.display_name) }
                        }
                    }
                }
            }
        )
    }
}
