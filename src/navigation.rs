//! The navigation bar shown at the top of every page.

use maud::{Markup, html};

use crate::{CatalogKind, endpoints, endpoints::format_catalog_endpoint};

/// A link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link {
    url: String,
    title: &'static str,
    is_current: bool,
}

impl Link {
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

pub struct NavBar {
    links: Vec<Link>,
}

impl NavBar {
    /// Get the navigation bar.
    ///
    /// The link whose URL is a prefix of `active_endpoint` is marked as
    /// active, so sub-pages such as `/catalog/types/1/edit` highlight their
    /// section.
    pub fn new(active_endpoint: &str) -> NavBar {
        let mut links = vec![Link {
            url: endpoints::OPERATIONS_VIEW.to_owned(),
            title: "Operations",
            is_current: false,
        }];

        links.extend(CatalogKind::ALL.map(|kind| Link {
            url: format_catalog_endpoint(endpoints::CATALOG_VIEW, kind, None),
            title: kind.descriptor().plural,
            is_current: false,
        }));

        for link in &mut links {
            link.is_current = active_endpoint == link.url
                || active_endpoint
                    .strip_prefix(&link.url)
                    .is_some_and(|rest| rest.starts_with('/'));
        }

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Cashflow"
                        }
                    }

                    div class="w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in self.links {
                                li { (link.into_html()) }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use crate::{CatalogKind, endpoints, endpoints::format_catalog_endpoint, navigation::NavBar};

    #[track_caller]
    fn assert_only_active(nav_bar: &NavBar, want_active: Option<&str>) {
        for link in &nav_bar.links {
            let should_be_active = Some(link.url.as_str()) == want_active;

            assert_eq!(
                link.is_current, should_be_active,
                "want link {} to be active={should_be_active}, got {}",
                link.url, link.is_current
            );
        }
    }

    #[test]
    fn set_active_endpoint() {
        let categories = format_catalog_endpoint(endpoints::CATALOG_VIEW, CatalogKind::Category, None);

        assert_only_active(
            &NavBar::new(endpoints::OPERATIONS_VIEW),
            Some(endpoints::OPERATIONS_VIEW),
        );
        assert_only_active(&NavBar::new(&categories), Some(categories.as_str()));
    }

    #[test]
    fn sub_pages_activate_their_section() {
        let types = format_catalog_endpoint(endpoints::CATALOG_VIEW, CatalogKind::Type, None);
        let edit_type =
            format_catalog_endpoint(endpoints::EDIT_CATALOG_ENTRY_VIEW, CatalogKind::Type, Some(1));

        assert_only_active(&NavBar::new(&edit_type), Some(types.as_str()));
        assert_only_active(
            &NavBar::new(endpoints::NEW_OPERATION_VIEW),
            Some(endpoints::OPERATIONS_VIEW),
        );
    }

    #[test]
    fn unrelated_pages_activate_nothing() {
        assert_only_active(&NavBar::new(endpoints::ROOT), None);
        assert_only_active(&NavBar::new(endpoints::INTERNAL_ERROR_VIEW), None);
    }

    #[test]
    fn similar_paths_are_not_confused() {
        // "/catalog/subcategories" must not activate "/catalog/categories" or
        // "/catalog/statuses".
        let subcategories =
            format_catalog_endpoint(endpoints::CATALOG_VIEW, CatalogKind::Subcategory, None);

        assert_only_active(&NavBar::new(&subcategories), Some(subcategories.as_str()));
    }
}
