pub mod shared {
    pub mod core {
        pub mod primitives;
    }
    pub mod infrastructure {
        pub mod change_feed;
    }
}

pub mod modules {
    pub mod live_orders {
        pub mod core {
            pub mod catalog;
            pub mod line_item;
            pub mod logical_order;
            pub mod reconstruct;
            pub mod status;
        }
        pub mod use_cases {
            pub mod refresh_live_orders {
                pub mod change_listener;
                pub mod handler;
                pub mod scheduler;
                pub mod inbound {
                    pub mod graphql;
                    pub mod http;
                }
            }
            pub mod list_live_orders {
                pub mod inbound {
                    pub mod graphql;
                    pub mod http;
                }
                pub mod projection;
                pub mod queries_port;
            }
        }
        pub mod adapters {
            pub mod outbound {
                pub mod backing_store_in_memory;
                pub mod line_item_sources;
                pub mod projections;
                pub mod projections_in_memory;
            }
        }
    }
}

pub mod shell;
