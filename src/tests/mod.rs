mod zk_login;
