//! Diesel table definitions.

diesel::table! {
    stories (id) {
        id -> Uuid,
        owner_id -> Uuid,
        character_sheet_id -> Nullable<Uuid>,
        title -> Text,
        prompt -> Text,
        child_name -> Text,
        child_age -> Int4,
        themes -> Array<Text>,
        art_style -> Text,
        page_count -> Int4,
        reading_level -> Text,
        language -> Text,
        status -> Text,
        like_count -> Int4,
        document_key -> Nullable<Text>,
        failure_summary -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    story_pages (id) {
        id -> Uuid,
        story_id -> Uuid,
        page_number -> Int4,
        kind -> Text,
        content -> Text,
        image_ref -> Nullable<Text>,
        image_prompt -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    character_sheets (id) {
        id -> Uuid,
        owner_id -> Uuid,
        hair_color -> Text,
        hair_style -> Text,
        eye_color -> Text,
        skin_tone -> Text,
        outfit -> Text,
        accessory -> Text,
        distinctive_features -> Text,
        reference_image_url -> Nullable<Text>,
        like_count -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    story_generations (id) {
        id -> Uuid,
        story_id -> Uuid,
        kind -> Text,
        status -> Text,
        error_message -> Nullable<Text>,
        started_at -> Timestamptz,
        finished_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(story_pages -> stories (story_id));
diesel::joinable!(story_generations -> stories (story_id));

diesel::allow_tables_to_appear_in_same_query!(
    stories,
    story_pages,
    character_sheets,
    story_generations,
);
