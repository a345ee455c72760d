diesel::table! {
    stripe_customers (id) {
        id -> Int8,
        user_id -> Text,
        customer_id -> Text,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    stripe_subscriptions (id) {
        id -> Int8,
        customer_id -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(stripe_customers, stripe_subscriptions,);
