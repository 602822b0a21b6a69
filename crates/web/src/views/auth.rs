//! Login and sign-up forms.

use yatube_common::FormErrors;

use super::{field_errors, html_escape, layout};

/// Login form; `next` is carried through as a hidden field.
#[must_use]
pub fn login_page(username: &str, next: Option<&str>, error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"error\">{}</p>\n", html_escape(e)))
        .unwrap_or_default();
    let next = next
        .map(|n| {
            format!(
                "<input type=\"hidden\" name=\"next\" value=\"{}\">\n",
                html_escape(n)
            )
        })
        .unwrap_or_default();

    let content = format!(
        "<h1>Log in</h1>\n{error}<form method=\"post\" action=\"/auth/login/\">\n{next}\
         <label for=\"id_username\">Username</label>\n\
         <input type=\"text\" name=\"username\" id=\"id_username\" value=\"{username}\" required>\n\
         <label for=\"id_password\">Password</label>\n\
         <input type=\"password\" name=\"password\" id=\"id_password\" required>\n\
         <button type=\"submit\">Log in</button>\n</form>\n\
         <p>No account? <a href=\"/auth/signup/\">Sign up</a></p>\n",
        username = html_escape(username),
    );
    layout("Log in", None, &content)
}

/// Sign-up form.
#[must_use]
pub fn signup_page(username: &str, name: &str, errors: &FormErrors) -> String {
    let content = format!(
        "<h1>Sign up</h1>\n<form method=\"post\" action=\"/auth/signup/\">\n\
         {username_errors}<label for=\"id_username\">Username</label>\n\
         <input type=\"text\" name=\"username\" id=\"id_username\" value=\"{username}\" required>\n\
         {name_errors}<label for=\"id_name\">Name</label>\n\
         <input type=\"text\" name=\"name\" id=\"id_name\" value=\"{name}\">\n\
         {password_errors}<label for=\"id_password1\">Password</label>\n\
         <input type=\"password\" name=\"password1\" id=\"id_password1\" required>\n\
         {password2_errors}<label for=\"id_password2\">Password confirmation</label>\n\
         <input type=\"password\" name=\"password2\" id=\"id_password2\" required>\n\
         <button type=\"submit\">Sign up</button>\n</form>\n",
        username_errors = field_errors(errors, "username"),
        username = html_escape(username),
        name_errors = field_errors(errors, "name"),
        name = html_escape(name),
        password_errors = field_errors(errors, "password"),
        password2_errors = field_errors(errors, "password2"),
    );
    layout("Sign up", None, &content)
}
