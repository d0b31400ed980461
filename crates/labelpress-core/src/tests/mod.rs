mod record;
mod value_template;
